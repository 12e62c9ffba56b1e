//! Lifecycle coordinator.
//!
//! Owns every proposal's lifecycle state machine. Ledger calls happen
//! outside the state lock: the transition is checked first, the ledger
//! call made, and the transition applied afterwards. A failed ledger call
//! leaves the lifecycle untouched.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::decision::VoteCodeMapping;
use crate::domain::feedback::MessageCollector;
use crate::domain::foundation::{
    DomainError, EventEnvelope, EventId, ObjectId, Percentage, ProposalId, Timestamp,
};
use crate::domain::proposal::events::VOTE_SUBMITTED;
use crate::domain::proposal::{
    proposals_envelope, Ballot, DaoState, LifecycleStatus, ProposalCreated, ProposalDraft,
    ProposalError, ProposalLifecycle, TransactionReceipt, VoteRecord, VoteSubmitted,
    VotingClosed, VotingStarted,
};
use crate::ports::{EventHandler, EventPublisher, LedgerGateway};

use super::chat_ingress::MessageIntake;
use super::errors::VotingError;
use super::retry::RetryPolicy;

/// Result of `create_proposal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProposal {
    pub digest: String,
    /// Id read back from the DAO; absent when the refresh failed.
    pub proposal_id: Option<ProposalId>,
}

/// Result of opening or closing a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundTransition {
    pub proposal_id: ProposalId,
    pub round: u32,
    pub status: LifecycleStatus,
    pub digest: String,
}

/// Manually entered vote, already scaled to 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualVote {
    pub vote_code: u8,
    pub sentiment: u8,
    pub confidence: u8,
}

pub struct LifecycleCoordinator {
    ledger: Arc<dyn LedgerGateway>,
    publisher: Arc<dyn EventPublisher>,
    collector: Option<Arc<MessageCollector>>,
    intake: Option<MessageIntake>,
    mapping: VoteCodeMapping,
    retry: RetryPolicy,
    lifecycles: Mutex<HashMap<ProposalId, ProposalLifecycle>>,
}

impl LifecycleCoordinator {
    pub fn new(
        ledger: Arc<dyn LedgerGateway>,
        publisher: Arc<dyn EventPublisher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            ledger,
            publisher,
            collector: None,
            intake: None,
            mapping: VoteCodeMapping::default(),
            retry,
            lifecycles: Mutex::new(HashMap::new()),
        }
    }

    /// Drains this collector into every `voting_started` event.
    pub fn with_collector(mut self, collector: Arc<MessageCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Intake feeding the collector. Opening a round waits for it to
    /// deliver everything already accepted.
    pub fn with_intake(mut self, intake: MessageIntake) -> Self {
        self.intake = Some(intake);
        self
    }

    pub fn with_vote_codes(mut self, mapping: VoteCodeMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn dao_id(&self) -> &ObjectId {
        self.ledger.dao_id()
    }

    /// Snapshot of a proposal's lifecycle.
    pub fn lifecycle(&self, proposal_id: &ProposalId) -> Option<ProposalLifecycle> {
        self.lock().get(proposal_id).cloned()
    }

    /// Reads the DAO object from the ledger.
    pub async fn dao_state(&self) -> Result<DaoState, VotingError> {
        let dao_id = self.ledger.dao_id().clone();
        Ok(self
            .retry
            .run("get_dao_state", || self.ledger.get_dao_state(&dao_id))
            .await?)
    }

    /// Creates a proposal. Not retried: a timed-out create may still have
    /// executed.
    ///
    /// The ledger receipt carries no proposal id; see [`resolve_created`].
    pub async fn create_proposal(
        &self,
        title: &str,
        description: &str,
    ) -> Result<CreatedProposal, VotingError> {
        let draft = ProposalDraft::new(title, description)?;
        let receipt = self.ledger.create_proposal(&draft).await?;

        let state = match self.dao_state().await {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(error = %e, "Proposal created but DAO state refresh failed");
                None
            }
        };
        let proposal_id = state.as_ref().and_then(|s| resolve_created(s, &draft));

        if let Some(id) = &proposal_id {
            self.lock()
                .entry(id.clone())
                .or_insert_with(|| ProposalLifecycle::new(id.clone()));
        }
        tracing::info!(
            proposal_id = ?proposal_id.as_ref().map(ProposalId::as_str),
            digest = %receipt.digest,
            "Proposal created"
        );

        let event = ProposalCreated {
            event_id: EventId::new(),
            dao_id: self.ledger.dao_id().clone(),
            proposal_id: proposal_id.clone(),
            title: draft.title().to_string(),
            digest: receipt.digest.clone(),
            created_at: Timestamp::now(),
        };
        self.emit(EventEnvelope::from_event(&event)).await;
        if let Some(state) = &state {
            self.emit(proposals_envelope(state)).await;
        }

        Ok(CreatedProposal {
            digest: receipt.digest,
            proposal_id,
        })
    }

    /// Opens a fresh round. Proposals created elsewhere are registered in
    /// `Created` once the ledger accepts the call.
    pub async fn open_voting(&self, proposal_id: &ProposalId) -> Result<RoundTransition, VotingError> {
        {
            let lifecycles = self.lock();
            match lifecycles.get(proposal_id) {
                Some(lifecycle) => lifecycle.ensure_can_transition(LifecycleStatus::VotingOpen)?,
                None => ProposalLifecycle::new(proposal_id.clone())
                    .ensure_can_transition(LifecycleStatus::VotingOpen)?,
            }
        }

        let receipt = self
            .retry
            .run("start_voting", || self.ledger.start_voting(proposal_id))
            .await?;

        let round = self
            .lock()
            .entry(proposal_id.clone())
            .or_insert_with(|| ProposalLifecycle::new(proposal_id.clone()))
            .start_round(Timestamp::now())?
            .round_number;

        let messages = self.drain_feedback().await;

        tracing::info!(
            proposal_id = %proposal_id,
            round,
            messages = messages.len(),
            digest = %receipt.digest,
            "Voting opened"
        );

        let event = VotingStarted {
            event_id: EventId::new(),
            proposal_id: proposal_id.clone(),
            round,
            status: LifecycleStatus::VotingOpen,
            messages,
            digest: receipt.digest.clone(),
            started_at: Timestamp::now(),
        };
        self.emit(EventEnvelope::from_event(&event)).await;
        self.publish_proposals().await;

        Ok(RoundTransition {
            proposal_id: proposal_id.clone(),
            round,
            status: LifecycleStatus::VotingOpen,
            digest: receipt.digest,
        })
    }

    /// Closes the open round. Votes still in flight will be rejected by
    /// the ledger.
    pub async fn close_voting(&self, proposal_id: &ProposalId) -> Result<RoundTransition, VotingError> {
        self.lock()
            .get(proposal_id)
            .ok_or_else(|| ProposalError::not_found(proposal_id.clone()))?
            .ensure_can_transition(LifecycleStatus::VotingClosed)?;

        let receipt = self
            .retry
            .run("close_voting", || self.ledger.close_voting(proposal_id))
            .await?;

        let round = {
            let mut lifecycles = self.lock();
            let lifecycle = lifecycles
                .get_mut(proposal_id)
                .ok_or_else(|| ProposalError::not_found(proposal_id.clone()))?;
            lifecycle.close_round(Timestamp::now())?.round_number
        };

        tracing::info!(
            proposal_id = %proposal_id,
            round,
            digest = %receipt.digest,
            "Voting closed"
        );

        let event = VotingClosed {
            event_id: EventId::new(),
            proposal_id: proposal_id.clone(),
            round,
            digest: receipt.digest.clone(),
            closed_at: Timestamp::now(),
        };
        self.emit(EventEnvelope::from_event(&event)).await;
        self.publish_proposals().await;

        Ok(RoundTransition {
            proposal_id: proposal_id.clone(),
            round,
            status: LifecycleStatus::VotingClosed,
            digest: receipt.digest,
        })
    }

    /// Records an agent's accepted vote. Moves the proposal to `Decided`.
    pub fn record_vote(&self, event: VoteSubmitted) -> Result<LifecycleStatus, ProposalError> {
        let mut lifecycles = self.lock();
        let lifecycle = lifecycles
            .get_mut(&event.proposal_id)
            .ok_or_else(|| ProposalError::not_found(event.proposal_id.clone()))?;

        lifecycle.record_vote(VoteRecord {
            proposal_id: event.proposal_id,
            agent_id: event.agent_id,
            round: event.round,
            vote: event.vote,
            scaled_score: event.scaled_score,
            scaled_confidence: event.scaled_confidence,
            submitted_at: event.submitted_at,
            ledger_digest: event.digest,
        })?;
        Ok(lifecycle.status())
    }

    /// Submits a vote entered by hand with the coordinator's credential.
    pub async fn submit_manual_vote(
        &self,
        proposal_id: &ProposalId,
        vote: ManualVote,
    ) -> Result<TransactionReceipt, VotingError> {
        let code = self.mapping.decode(vote.vote_code)?;
        let ballot = Ballot {
            proposal_id: proposal_id.clone(),
            vote_code: self.mapping.encode(code),
            scaled_score: Percentage::try_new(vote.sentiment)?,
            scaled_confidence: Percentage::try_new(vote.confidence)?,
            cast_at: Timestamp::now(),
        };

        let receipt = self
            .retry
            .run("vote", || self.ledger.submit_vote(&ballot))
            .await?;
        tracing::info!(
            proposal_id = %proposal_id,
            vote = %code,
            digest = %receipt.digest,
            "Manual vote submitted"
        );
        self.publish_proposals().await;
        Ok(receipt)
    }

    pub async fn invite_member(&self, address: &ObjectId) -> Result<TransactionReceipt, VotingError> {
        let receipt = self
            .retry
            .run("invite_member", || self.ledger.invite_member(address))
            .await?;
        tracing::info!(address = %address, digest = %receipt.digest, "Member invited");
        self.publish_proposals().await;
        Ok(receipt)
    }

    /// Refreshes the DAO and broadcasts the proposal list. Failures are
    /// logged only.
    pub async fn publish_proposals(&self) {
        match self.dao_state().await {
            Ok(state) => self.emit(proposals_envelope(&state)).await,
            Err(e) => tracing::warn!(error = %e, "Failed to refresh proposals"),
        }
    }

    /// Waits for queued chat messages, then takes the collected batch.
    async fn drain_feedback(&self) -> Vec<String> {
        if let Some(intake) = &self.intake {
            if let Err(e) = intake.flush().await {
                tracing::warn!(error = %e, "Message intake flush failed");
            }
        }
        self.collector
            .as_ref()
            .map(|c| c.drain_and_reset().into_messages())
            .unwrap_or_default()
    }

    async fn emit(&self, envelope: Result<EventEnvelope, DomainError>) {
        let result = match envelope {
            Ok(envelope) => {
                let event_type = envelope.event_type.clone();
                self.publisher
                    .publish(envelope)
                    .await
                    .map_err(|e| (event_type, e))
            }
            Err(e) => Err(("unknown".to_string(), e)),
        };
        if let Err((event_type, e)) = result {
            tracing::warn!(event_type = %event_type, error = %e, "Failed to publish event");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProposalId, ProposalLifecycle>> {
        self.lifecycles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EventHandler for LifecycleCoordinator {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if event.event_type != VOTE_SUBMITTED {
            return Ok(());
        }
        let submitted: VoteSubmitted = event.payload_as()?;
        let proposal_id = submitted.proposal_id.clone();
        let agent_id = submitted.agent_id.clone();

        match self.record_vote(submitted) {
            Ok(status) => {
                tracing::debug!(
                    proposal_id = %proposal_id,
                    agent = %agent_id,
                    status = %status,
                    "Vote recorded"
                );
                Ok(())
            }
            // At-least-once delivery: a repeat is expected.
            Err(ProposalError::DuplicateVote { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "LifecycleCoordinator"
    }
}

/// Newest proposal matching the draft's title and description. Two
/// concurrent creates of identical drafts may resolve to the same id.
fn resolve_created(state: &DaoState, draft: &ProposalDraft) -> Option<ProposalId> {
    state
        .proposals
        .iter()
        .rev()
        .find(|p| p.title == draft.title() && p.description == draft.description())
        .map(|p| p.id.clone())
}
