//! Proposal lifecycle events.
//!
//! Payloads use camelCase field names; the dashboard and out-of-process
//! agents read them as plain JSON.

use serde::{Deserialize, Serialize};

use crate::domain::decision::VoteCode;
use crate::domain::foundation::{
    domain_event, AgentId, DomainError, ErrorCode, EventEnvelope, EventId, ObjectId, Percentage,
    ProposalId, Timestamp,
};

use super::{DaoState, LifecycleStatus};

pub const PROPOSAL_CREATED: &str = "proposal_created";
pub const VOTING_STARTED: &str = "voting_started";
pub const VOTE_SUBMITTED: &str = "vote_submitted";
pub const VOTING_CLOSED: &str = "voting_closed";
pub const PROPOSALS: &str = "proposals";

/// Every event type a dashboard client may receive.
pub const LIFECYCLE_EVENT_TYPES: &[&str] = &[
    PROPOSAL_CREATED,
    VOTING_STARTED,
    VOTE_SUBMITTED,
    VOTING_CLOSED,
    PROPOSALS,
];

/// A proposal was committed to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCreated {
    pub event_id: EventId,
    pub dao_id: ObjectId,
    /// Resolved from the refreshed DAO state; absent if the refresh failed.
    pub proposal_id: Option<ProposalId>,
    pub title: String,
    pub digest: String,
    pub created_at: Timestamp,
}

domain_event!(
    ProposalCreated,
    event_type = "proposal_created",
    schema_version = 1,
    aggregate_id = dao_id,
    aggregate_type = "Dao",
    occurred_at = created_at,
    event_id = event_id
);

/// A voting round opened. Carries the coordinator-side message batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStarted {
    pub event_id: EventId,
    pub proposal_id: ProposalId,
    pub round: u32,
    pub status: LifecycleStatus,
    pub messages: Vec<String>,
    pub digest: String,
    pub started_at: Timestamp,
}

domain_event!(
    VotingStarted,
    event_type = "voting_started",
    schema_version = 1,
    aggregate_id = proposal_id,
    aggregate_type = "Proposal",
    occurred_at = started_at,
    event_id = event_id
);

/// An agent's vote was accepted by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSubmitted {
    pub event_id: EventId,
    pub proposal_id: ProposalId,
    pub agent_id: AgentId,
    pub round: u32,
    pub vote: VoteCode,
    pub vote_code: u8,
    pub scaled_score: Percentage,
    pub scaled_confidence: Percentage,
    pub digest: String,
    pub submitted_at: Timestamp,
}

domain_event!(
    VoteSubmitted,
    event_type = "vote_submitted",
    schema_version = 1,
    aggregate_id = proposal_id,
    aggregate_type = "Proposal",
    occurred_at = submitted_at,
    event_id = event_id
);

/// A voting round closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingClosed {
    pub event_id: EventId,
    pub proposal_id: ProposalId,
    pub round: u32,
    pub digest: String,
    pub closed_at: Timestamp,
}

domain_event!(
    VotingClosed,
    event_type = "voting_closed",
    schema_version = 1,
    aggregate_id = proposal_id,
    aggregate_type = "Proposal",
    occurred_at = closed_at,
    event_id = event_id
);

/// Builds the `proposals` broadcast: the payload is the bare proposal list.
pub fn proposals_envelope(state: &DaoState) -> Result<EventEnvelope, DomainError> {
    let payload = serde_json::to_value(&state.proposals).map_err(|e| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("Failed to serialize proposals: {}", e),
        )
    })?;
    Ok(EventEnvelope::new(PROPOSALS, state.dao_id.to_string(), "Dao", payload))
}
