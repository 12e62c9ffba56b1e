//! Ledger Gateway Port - Interface to the on-chain DAO.
//!
//! Every mutating call builds exactly one transaction, signs it with the
//! credential held by the implementation, submits it and waits for local
//! execution. Nothing read through this port is cached.
//!
//! # Failure classes
//!
//! - `Unavailable` is transient (network, timeouts, node overload) and
//!   may be retried by the caller.
//! - `Rejected` is permanent: the transaction executed and failed, or the
//!   node refused it. Retrying would fail the same way.
//! - `ObjectNotFound`, `MalformedState` and `UnsupportedObjectKind` come
//!   from reading the DAO object.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ObjectId, ProposalId};
use crate::domain::proposal::{Ballot, DaoState, ProposalDraft, TransactionReceipt};

/// Port for DAO reads and transactions.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Fetches and decodes the DAO object.
    async fn get_dao_state(&self, dao_id: &ObjectId) -> Result<DaoState, LedgerError>;

    /// Submits a `create_proposal` transaction.
    async fn create_proposal(&self, draft: &ProposalDraft)
        -> Result<TransactionReceipt, LedgerError>;

    /// Opens on-chain voting for a proposal.
    async fn start_voting(&self, proposal_id: &ProposalId)
        -> Result<TransactionReceipt, LedgerError>;

    /// Casts one vote with the implementation's credential.
    async fn submit_vote(&self, ballot: &Ballot) -> Result<TransactionReceipt, LedgerError>;

    /// Closes on-chain voting for a proposal.
    async fn close_voting(&self, proposal_id: &ProposalId)
        -> Result<TransactionReceipt, LedgerError>;

    /// Invites an address into the DAO.
    async fn invite_member(&self, address: &ObjectId) -> Result<TransactionReceipt, LedgerError>;

    /// The DAO this gateway transacts against.
    fn dao_id(&self) -> &ObjectId;

    /// Address of the signing account.
    fn signer_address(&self) -> String;
}

/// Errors from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Network failure, timeout or overloaded node.
    #[error("ledger unavailable: {message}")]
    Unavailable { message: String },

    /// Transaction refused or executed with a failure status.
    #[error("ledger rejected transaction: {message}")]
    Rejected {
        message: String,
        /// Digest of the failed transaction when it was executed.
        digest: Option<String>,
        /// Contract or RPC error code when the node reported one.
        code: Option<String>,
    },

    /// The requested object does not exist.
    #[error("object not found: {object_id}")]
    ObjectNotFound { object_id: String },

    /// The object exists but lacks required fields.
    #[error("malformed ledger state: {reason}")]
    MalformedState { reason: String },

    /// The object is not a DAO (e.g. a package).
    #[error("unsupported object kind: {kind}")]
    UnsupportedObjectKind { kind: String },
}

impl LedgerError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            digest: None,
            code: None,
        }
    }

    /// Rejection of an executed transaction.
    pub fn rejected_with_digest(message: impl Into<String>, digest: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            digest: Some(digest.into()),
            code: None,
        }
    }

    /// Rejection carrying the node's error code.
    pub fn rejected_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            digest: None,
            code: Some(code.into()),
        }
    }

    pub fn object_not_found(object_id: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            object_id: object_id.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedState {
            reason: reason.into(),
        }
    }

    pub fn unsupported_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedObjectKind { kind: kind.into() }
    }

    /// Only transient failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable { .. } => ErrorCode::LedgerUnavailable,
            Self::Rejected { .. } => ErrorCode::LedgerRejected,
            Self::ObjectNotFound { .. } => ErrorCode::ObjectNotFound,
            Self::MalformedState { .. } => ErrorCode::MalformedState,
            Self::UnsupportedObjectKind { .. } => ErrorCode::UnsupportedObjectKind,
        }
    }
}

impl From<LedgerError> for DomainError {
    fn from(err: LedgerError) -> Self {
        let mut domain = DomainError::new(err.code(), err.to_string());
        if let LedgerError::Rejected { digest, code, .. } = &err {
            if let Some(digest) = digest {
                domain = domain.with_detail("digest", digest.clone());
            }
            if let Some(code) = code {
                domain = domain.with_detail("ledger_code", code.clone());
            }
        }
        domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn LedgerGateway) {}

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(LedgerError::unavailable("timeout").is_retryable());
        assert!(!LedgerError::rejected("abort").is_retryable());
        assert!(!LedgerError::object_not_found("0x1").is_retryable());
        assert!(!LedgerError::malformed("no proposals").is_retryable());
        assert!(!LedgerError::unsupported_kind("package").is_retryable());
    }

    #[test]
    fn rejection_details_survive_domain_conversion() {
        let err = LedgerError::Rejected {
            message: "MoveAbort".to_string(),
            digest: Some("9xQ".to_string()),
            code: Some("3".to_string()),
        };
        let domain: DomainError = err.into();

        assert_eq!(domain.code, ErrorCode::LedgerRejected);
        assert_eq!(domain.details.get("digest"), Some(&"9xQ".to_string()));
        assert_eq!(domain.details.get("ledger_code"), Some(&"3".to_string()));
    }
}
