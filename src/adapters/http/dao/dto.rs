//! Request and response bodies for the DAO endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::proposal::{LifecycleStatus, ProposalLifecycle, VoteRecord, VotingRound};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProposalRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Manual vote. `sentiment` and `confidence` are already scaled to 0..=100.
///
/// Numbers are read wide so out-of-range input is a validation error
/// rather than a body rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub proposal_id: String,
    pub vote_code: i64,
    pub sentiment: i64,
    pub confidence: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteMemberRequest {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestResponse {
    pub digest: String,
}

/// Local lifecycle view of one proposal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleResponse {
    pub proposal_id: String,
    pub status: LifecycleStatus,
    pub created_at: Timestamp,
    pub rounds: Vec<VotingRound>,
    pub votes: Vec<VoteRecord>,
}

impl From<ProposalLifecycle> for LifecycleResponse {
    fn from(lifecycle: ProposalLifecycle) -> Self {
        Self {
            proposal_id: lifecycle.proposal_id().to_string(),
            status: lifecycle.status(),
            created_at: lifecycle.created_at(),
            rounds: lifecycle.rounds().to_vec(),
            votes: lifecycle.votes().to_vec(),
        }
    }
}

/// Error body. Ledger failures carry the transaction digest and contract
/// error code when known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_code: Option<String>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed.to_string(),
            message: message.into(),
            digest: None,
            ledger_code: None,
        }
    }
}

impl From<&DomainError> for ErrorResponse {
    fn from(err: &DomainError) -> Self {
        Self {
            code: err.code.to_string(),
            message: err.message.clone(),
            digest: err.details.get("digest").cloned(),
            ledger_code: err.details.get("ledger_code").cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_request_reads_camel_case() {
        let req: VoteRequest = serde_json::from_str(
            r#"{"proposalId": "3", "voteCode": 2, "sentiment": 80, "confidence": 90}"#,
        )
        .unwrap();
        assert_eq!(req.proposal_id, "3");
        assert_eq!(req.vote_code, 2);
    }

    #[test]
    fn error_response_carries_ledger_details() {
        let err = DomainError::new(ErrorCode::LedgerRejected, "abort")
            .with_detail("digest", "D1")
            .with_detail("ledger_code", "4");

        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();

        assert_eq!(body["code"], "LEDGER_REJECTED");
        assert_eq!(body["digest"], "D1");
        assert_eq!(body["ledgerCode"], "4");
    }

    #[test]
    fn error_response_omits_absent_details() {
        let body = serde_json::to_value(ErrorResponse::bad_request("nope")).unwrap();
        assert!(body.get("digest").is_none());
        assert!(body.get("ledgerCode").is_none());
    }
}
