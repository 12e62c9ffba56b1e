//! Proposal lifecycle error types.

use crate::domain::foundation::{AgentId, DomainError, ErrorCode, ProposalId, ValidationError};

use super::LifecycleStatus;

/// Errors raised by the proposal lifecycle aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum ProposalError {
    /// Proposal is not tracked.
    NotFound(ProposalId),
    /// The requested lifecycle transition is not allowed.
    InvalidTransition {
        proposal_id: ProposalId,
        from: LifecycleStatus,
        to: LifecycleStatus,
    },
    /// The agent already has a vote recorded in this round.
    DuplicateVote {
        proposal_id: ProposalId,
        agent_id: AgentId,
    },
    /// A vote referenced a round that is not the open one.
    RoundMismatch {
        proposal_id: ProposalId,
        expected: Option<u32>,
        actual: u32,
    },
    /// Validation failed.
    ValidationFailed { field: String, message: String },
}

impl ProposalError {
    pub fn not_found(id: ProposalId) -> Self {
        ProposalError::NotFound(id)
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProposalError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ProposalError::NotFound(_) => ErrorCode::ProposalNotFound,
            ProposalError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            ProposalError::DuplicateVote { .. } => ErrorCode::VoteAlreadyCast,
            ProposalError::RoundMismatch { .. } => ErrorCode::InvalidStateTransition,
            ProposalError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ProposalError::NotFound(id) => format!("Proposal not found: {}", id),
            ProposalError::InvalidTransition {
                proposal_id,
                from,
                to,
            } => format!(
                "Proposal {} cannot move from {} to {}",
                proposal_id, from, to
            ),
            ProposalError::DuplicateVote {
                proposal_id,
                agent_id,
            } => format!(
                "Agent {} already voted on proposal {} this round",
                agent_id, proposal_id
            ),
            ProposalError::RoundMismatch {
                proposal_id,
                expected,
                actual,
            } => match expected {
                Some(expected) => format!(
                    "Vote for round {} of proposal {} but round {} is open",
                    actual, proposal_id, expected
                ),
                None => format!(
                    "Vote for round {} of proposal {} but no round is open",
                    actual, proposal_id
                ),
            },
            ProposalError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
        }
    }
}

impl std::fmt::Display for ProposalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ProposalError {}

impl From<ValidationError> for ProposalError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => {
                ProposalError::validation(field, "cannot be empty")
            }
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => ProposalError::validation(
                field,
                format!("must be between {} and {}, got {}", min, max, actual),
            ),
            ValidationError::InvalidFormat { field, reason } => {
                ProposalError::validation(field, reason)
            }
        }
    }
}

impl From<ProposalError> for DomainError {
    fn from(err: ProposalError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
