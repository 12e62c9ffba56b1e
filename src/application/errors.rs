//! Application-level error type.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::domain::proposal::ProposalError;
use crate::ports::{LedgerError, ScoringError};

/// Errors from lifecycle and voting operations.
#[derive(Debug, Clone, Error)]
pub enum VotingError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Lifecycle(#[from] ProposalError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Event(DomainError),
}

impl VotingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            VotingError::Ledger(e) => e.code(),
            VotingError::Scoring(e) => e.code(),
            VotingError::Lifecycle(e) => e.code(),
            VotingError::Validation(_) => ErrorCode::ValidationFailed,
            VotingError::Event(e) => e.code,
        }
    }

    /// True when the failure is worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            VotingError::Ledger(e) => e.is_retryable(),
            VotingError::Scoring(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<VotingError> for DomainError {
    fn from(err: VotingError) -> Self {
        match err {
            VotingError::Ledger(e) => e.into(),
            VotingError::Scoring(e) => e.into(),
            VotingError::Lifecycle(e) => e.into(),
            VotingError::Validation(e) => e.into(),
            VotingError::Event(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ProposalId;

    #[test]
    fn codes_follow_the_wrapped_error() {
        let not_found = VotingError::from(ProposalError::not_found(ProposalId::new("1").unwrap()));
        assert_eq!(not_found.code(), ErrorCode::ProposalNotFound);

        let rejected = VotingError::from(LedgerError::rejected("abort"));
        assert_eq!(rejected.code(), ErrorCode::LedgerRejected);
        assert!(!rejected.is_transient());

        assert!(VotingError::from(LedgerError::unavailable("timeout")).is_transient());
    }

    #[test]
    fn ledger_details_survive_conversion() {
        let err: DomainError =
            VotingError::from(LedgerError::rejected_with_digest("abort", "D1")).into();
        assert_eq!(err.code, ErrorCode::LedgerRejected);
        assert_eq!(err.details.get("digest").map(String::as_str), Some("D1"));
    }
}
