//! Ledger-facing proposal and DAO views.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{ObjectId, ProposalId, ValidationError};

/// Maximum accepted title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum accepted description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 5_000;

/// Validated input for a new proposal, before the ledger assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    title: String,
    description: String,
}

impl ProposalDraft {
    /// Creates a draft, trimming and rejecting blank or oversized fields.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into().trim().to_string();
        let description = description.into().trim().to_string();

        if title.is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        if description.is_empty() {
            return Err(ValidationError::empty_field("description"));
        }
        check_len("title", &title, MAX_TITLE_LEN)?;
        check_len("description", &description, MAX_DESCRIPTION_LEN)?;

        Ok(Self { title, description })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::out_of_range(
            field,
            1,
            i32::try_from(max).unwrap_or(i32::MAX),
            i32::try_from(len).unwrap_or(i32::MAX),
        ));
    }
    Ok(())
}

/// One proposal as stored inside the DAO object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: ProposalId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Raw on-chain vote entries; their layout belongs to the contract.
    #[serde(default)]
    pub votes: Vec<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Decoded snapshot of the DAO object. Never cached beyond one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaoState {
    pub dao_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<String>,
    pub proposals: Vec<ProposalRecord>,
}

impl DaoState {
    pub fn find(&self, id: &ProposalId) -> Option<&ProposalRecord> {
        self.proposals.iter().find(|p| &p.id == id)
    }
}

/// Outcome of a committed ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub digest: String,
}

impl TransactionReceipt {
    pub fn new(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
        }
    }
}
