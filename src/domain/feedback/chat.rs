//! Classification of inbound chat text.
//!
//! `!`-prefixed text is a command and never reaches the collector.

use crate::domain::foundation::ProposalId;

/// A command addressed to the lifecycle coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `!proposal <title> | <description>`
    CreateProposal { title: String, description: String },
    /// `!vote <proposal id>`
    StartVoting { proposal_id: ProposalId },
    /// `!endvote <proposal id>`
    CloseVoting { proposal_id: ProposalId },
}

/// One inbound chat message after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Community feedback to collect for sentiment analysis.
    Feedback(String),
    /// A recognised command.
    Command(ChatCommand),
    /// A command that could not be parsed; carries a usage hint.
    Invalid { usage: &'static str },
    /// Nothing to do (blank text or a bot author).
    Ignored,
}

pub const PROPOSAL_USAGE: &str = "Usage: !proposal <title> | <description>";
pub const VOTE_USAGE: &str = "Usage: !vote <proposal id>";
pub const END_VOTE_USAGE: &str = "Usage: !endvote <proposal id>";
pub const UNKNOWN_COMMAND_USAGE: &str =
    "Commands: !proposal <title> | <description>, !vote <id>, !endvote <id>";

impl ChatInput {
    /// Classifies a message from `author_is_bot`.
    pub fn parse(content: &str, author_is_bot: bool) -> Self {
        if author_is_bot {
            return ChatInput::Ignored;
        }
        let text = content.trim();
        if text.is_empty() {
            return ChatInput::Ignored;
        }
        let Some(command_text) = text.strip_prefix('!') else {
            return ChatInput::Feedback(text.to_string());
        };

        let (name, rest) = match command_text.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command_text, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "proposal" => parse_proposal(rest),
            "vote" => parse_proposal_id(rest)
                .map(|proposal_id| ChatInput::Command(ChatCommand::StartVoting { proposal_id }))
                .unwrap_or(ChatInput::Invalid { usage: VOTE_USAGE }),
            "endvote" => parse_proposal_id(rest)
                .map(|proposal_id| ChatInput::Command(ChatCommand::CloseVoting { proposal_id }))
                .unwrap_or(ChatInput::Invalid {
                    usage: END_VOTE_USAGE,
                }),
            _ => ChatInput::Invalid {
                usage: UNKNOWN_COMMAND_USAGE,
            },
        }
    }
}

fn parse_proposal(rest: &str) -> ChatInput {
    let invalid = ChatInput::Invalid {
        usage: PROPOSAL_USAGE,
    };
    let Some((title, description)) = rest.split_once('|') else {
        return invalid;
    };
    let (title, description) = (title.trim(), description.trim());
    if title.is_empty() || description.is_empty() {
        return invalid;
    }
    ChatInput::Command(ChatCommand::CreateProposal {
        title: title.to_string(),
        description: description.to_string(),
    })
}

fn parse_proposal_id(rest: &str) -> Option<ProposalId> {
    let mut parts = rest.split_whitespace();
    let id = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    ProposalId::new(id).ok()
}
