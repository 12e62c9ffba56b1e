//! Chat ingress: classifies inbound messages, feeds the collectors and
//! dispatches commands to the coordinator.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::feedback::{ChatCommand, ChatInput, MessageCollector};
use crate::domain::foundation::{DomainError, ErrorCode};

use super::lifecycle_coordinator::LifecycleCoordinator;

enum IntakeItem {
    Message(String),
    Flush(oneshot::Sender<()>),
}

/// Bounded queue in front of one or more collectors.
///
/// A single task applies pushes, so every collector sees messages in
/// submission order. A full queue makes `submit` wait.
#[derive(Clone)]
pub struct MessageIntake {
    tx: mpsc::Sender<IntakeItem>,
}

impl MessageIntake {
    /// Starts the collector task. It ends when every intake handle is dropped.
    pub fn spawn(collectors: Vec<Arc<MessageCollector>>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                match item {
                    IntakeItem::Message(message) => {
                        for collector in &collectors {
                            collector.push(message.clone());
                        }
                    }
                    IntakeItem::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Message intake stopped");
        });

        (Self { tx }, handle)
    }

    pub async fn submit(&self, message: impl Into<String>) -> Result<(), DomainError> {
        self.tx
            .send(IntakeItem::Message(message.into()))
            .await
            .map_err(|_| intake_closed())
    }

    /// Waits until every message submitted before this call is collected.
    pub async fn flush(&self) -> Result<(), DomainError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(IntakeItem::Flush(done_tx))
            .await
            .map_err(|_| intake_closed())?;
        done_rx.await.map_err(|_| intake_closed())
    }
}

fn intake_closed() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "Message intake is closed")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Collected,
    Ignored,
    Command,
    Usage,
    Failed,
}

/// What the chat source should tell the author, if anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub action: ChatAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

impl ChatReply {
    fn silent(action: ChatAction) -> Self {
        Self { action, reply: None }
    }

    fn say(action: ChatAction, reply: impl Into<String>) -> Self {
        Self {
            action,
            reply: Some(reply.into()),
        }
    }
}

pub struct ChatIngress {
    intake: MessageIntake,
    coordinator: Arc<LifecycleCoordinator>,
}

impl ChatIngress {
    pub fn new(intake: MessageIntake, coordinator: Arc<LifecycleCoordinator>) -> Self {
        Self { intake, coordinator }
    }

    pub async fn handle_message(&self, content: &str, author_is_bot: bool) -> ChatReply {
        match ChatInput::parse(content, author_is_bot) {
            ChatInput::Ignored => ChatReply::silent(ChatAction::Ignored),
            ChatInput::Invalid { usage } => ChatReply::say(ChatAction::Usage, usage),
            ChatInput::Feedback(text) => match self.intake.submit(text).await {
                Ok(()) => ChatReply::silent(ChatAction::Collected),
                Err(e) => ChatReply::say(ChatAction::Failed, e.message),
            },
            ChatInput::Command(command) => self.dispatch(command).await,
        }
    }

    async fn dispatch(&self, command: ChatCommand) -> ChatReply {
        let outcome = match command {
            ChatCommand::CreateProposal { title, description } => self
                .coordinator
                .create_proposal(&title, &description)
                .await
                .map(|created| match created.proposal_id {
                    Some(id) => format!("Proposal {} created: {}", id, title),
                    None => format!("Proposal created: {} (tx {})", title, created.digest),
                }),
            ChatCommand::StartVoting { proposal_id } => self
                .coordinator
                .open_voting(&proposal_id)
                .await
                .map(|t| format!("Voting started for proposal {} (round {})", t.proposal_id, t.round)),
            ChatCommand::CloseVoting { proposal_id } => self
                .coordinator
                .close_voting(&proposal_id)
                .await
                .map(|t| format!("Voting closed for proposal {}", t.proposal_id)),
        };

        match outcome {
            Ok(text) => ChatReply::say(ChatAction::Command, text),
            Err(e) => {
                tracing::warn!(error = %e, "Chat command failed");
                ChatReply::say(ChatAction::Failed, e.to_string())
            }
        }
    }
}
