//! Per-round idempotency claims for one agent's votes.
//!
//! A claim is taken before any work on a `voting_started` event. A second
//! delivery for the same round finds the claim and does nothing. Failed
//! attempts release the claim. Each proposal also keeps a floor: rounds at
//! or below it are closed or superseded, and late deliveries for them are
//! refused.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::foundation::{AgentId, ProposalId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimState {
    /// Decision or submission under way.
    InFlight { round: u32 },
    /// The ledger accepted the vote.
    Cast { round: u32, digest: String },
}

impl ClaimState {
    pub fn round(&self) -> u32 {
        match self {
            ClaimState::InFlight { round } | ClaimState::Cast { round, .. } => *round,
        }
    }
}

/// Answer to a claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Taken,
    /// This round is already claimed.
    Duplicate,
    /// The round is closed or a newer one has been claimed.
    Stale,
}

#[derive(Debug, Default)]
struct Claims {
    held: HashMap<(ProposalId, AgentId), ClaimState>,
    floors: HashMap<ProposalId, u32>,
}

impl Claims {
    fn floor(&self, proposal_id: &ProposalId) -> u32 {
        self.floors.get(proposal_id).copied().unwrap_or(0)
    }

    fn raise_floor(&mut self, proposal_id: &ProposalId, round: u32) {
        let floor = self.floors.entry(proposal_id.clone()).or_insert(0);
        *floor = (*floor).max(round);
    }
}

#[derive(Debug, Default)]
pub struct VoteRegistry {
    claims: Mutex<Claims>,
}

impl VoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `round` of a proposal for an agent.
    pub fn try_claim(&self, proposal_id: &ProposalId, agent_id: &AgentId, round: u32) -> Claim {
        let mut claims = self.lock();
        if round <= claims.floor(proposal_id) {
            return Claim::Stale;
        }

        let key = (proposal_id.clone(), agent_id.clone());
        if let Some(existing) = claims.held.get(&key) {
            if existing.round() == round {
                return Claim::Duplicate;
            }
            if existing.round() > round {
                return Claim::Stale;
            }
        }

        claims.held.insert(key, ClaimState::InFlight { round });
        claims.raise_floor(proposal_id, round.saturating_sub(1));
        Claim::Taken
    }

    /// Records the accepted vote. Ignored once the round is closed.
    pub fn mark_cast(&self, proposal_id: &ProposalId, agent_id: &AgentId, round: u32, digest: &str) {
        let mut claims = self.lock();
        if round <= claims.floor(proposal_id) {
            return;
        }
        claims.held.insert(
            (proposal_id.clone(), agent_id.clone()),
            ClaimState::Cast {
                round,
                digest: digest.to_string(),
            },
        );
    }

    /// Drops an in-flight claim on `round` after a failure. Cast claims stay.
    pub fn release(&self, proposal_id: &ProposalId, agent_id: &AgentId, round: u32) {
        let mut claims = self.lock();
        let key = (proposal_id.clone(), agent_id.clone());
        if claims.held.get(&key) == Some(&ClaimState::InFlight { round }) {
            claims.held.remove(&key);
        }
    }

    /// Closes every round up to `round`. Returns how many claims were dropped.
    pub fn close_round(&self, proposal_id: &ProposalId, round: u32) -> usize {
        let mut claims = self.lock();
        claims.raise_floor(proposal_id, round);
        let before = claims.held.len();
        claims
            .held
            .retain(|(pid, _), claim| pid != proposal_id || claim.round() > round);
        before - claims.held.len()
    }

    pub fn state(&self, proposal_id: &ProposalId, agent_id: &AgentId) -> Option<ClaimState> {
        self.lock()
            .held
            .get(&(proposal_id.clone(), agent_id.clone()))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Claims> {
        self.claims
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
