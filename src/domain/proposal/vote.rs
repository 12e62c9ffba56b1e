//! Ballots sent to the ledger and votes recorded locally.

use serde::{Deserialize, Serialize};

use crate::domain::decision::{DecisionResult, VoteCode, VoteCodeMapping};
use crate::domain::foundation::{AgentId, Percentage, ProposalId, Timestamp};

/// Arguments of one on-chain `vote` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub proposal_id: ProposalId,
    /// Vote code already encoded for the contract.
    pub vote_code: u8,
    pub scaled_score: Percentage,
    pub scaled_confidence: Percentage,
    pub cast_at: Timestamp,
}

impl Ballot {
    /// Builds the ballot for an automated decision.
    pub fn from_decision(
        proposal_id: ProposalId,
        vote: VoteCode,
        result: &DecisionResult,
        mapping: &VoteCodeMapping,
    ) -> Self {
        Self {
            proposal_id,
            vote_code: mapping.encode(vote),
            scaled_score: result.scaled_score(),
            scaled_confidence: result.scaled_confidence(),
            cast_at: Timestamp::now(),
        }
    }
}

/// A vote the ledger accepted. At most one per agent per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub agent_id: AgentId,
    pub round: u32,
    pub vote: VoteCode,
    pub scaled_score: Percentage,
    pub scaled_confidence: Percentage,
    pub submitted_at: Timestamp,
    pub ledger_digest: String,
}
