//! Proposal lifecycle aggregate.
//!
//! ```text
//! Created ──► VotingOpen ──► Decided ──► VotingClosed
//!                 │                          │
//!                 └──────────► VotingClosed ◄┘
//!                                   │
//!              (reopen) VotingOpen ◄┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{AgentId, ProposalId, StateMachine, Timestamp};

use super::{ProposalError, VoteRecord};

/// Lifecycle status of one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Created,
    VotingOpen,
    /// At least one agent vote recorded in the open round.
    Decided,
    VotingClosed,
}

impl LifecycleStatus {
    /// True while a round accepts votes.
    pub fn accepts_votes(&self) -> bool {
        matches!(self, LifecycleStatus::VotingOpen | LifecycleStatus::Decided)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleStatus::Created => "created",
            LifecycleStatus::VotingOpen => "voting_open",
            LifecycleStatus::Decided => "decided",
            LifecycleStatus::VotingClosed => "voting_closed",
        };
        write!(f, "{}", s)
    }
}

impl StateMachine for LifecycleStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use LifecycleStatus::*;
        matches!(
            (self, target),
            (Created, VotingOpen)
                | (VotingOpen, Decided)
                | (Decided, Decided)
                | (VotingOpen, VotingClosed)
                | (Decided, VotingClosed)
                | (VotingClosed, VotingOpen)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LifecycleStatus::*;
        match self {
            Created => vec![VotingOpen],
            VotingOpen => vec![Decided, VotingClosed],
            Decided => vec![Decided, VotingClosed],
            VotingClosed => vec![VotingOpen],
        }
    }
}

/// Status of a voting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Open,
    Closed,
}

/// Window between `start_voting` and `close_voting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingRound {
    pub proposal_id: ProposalId,
    pub round_number: u32,
    pub status: RoundStatus,
    pub opened_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<Timestamp>,
}

/// Lifecycle of a single proposal across its voting rounds.
///
/// At most one round is open at any time; votes are recorded against the
/// open round and each agent votes at most once per round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalLifecycle {
    proposal_id: ProposalId,
    status: LifecycleStatus,
    rounds: Vec<VotingRound>,
    votes: Vec<VoteRecord>,
    created_at: Timestamp,
}

impl ProposalLifecycle {
    pub fn new(proposal_id: ProposalId) -> Self {
        Self {
            proposal_id,
            status: LifecycleStatus::Created,
            rounds: Vec::new(),
            votes: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    pub fn proposal_id(&self) -> &ProposalId {
        &self.proposal_id
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn rounds(&self) -> &[VotingRound] {
        &self.rounds
    }

    /// The round currently accepting votes, if any.
    pub fn open_round(&self) -> Option<&VotingRound> {
        self.rounds
            .last()
            .filter(|round| round.status == RoundStatus::Open)
    }

    /// Votes recorded in the given round.
    pub fn votes_in_round(&self, round_number: u32) -> Vec<&VoteRecord> {
        self.votes
            .iter()
            .filter(|v| v.round == round_number)
            .collect()
    }

    pub fn votes(&self) -> &[VoteRecord] {
        &self.votes
    }

    /// Opens a fresh round. Valid from `Created` or `VotingClosed`.
    pub fn start_round(&mut self, now: Timestamp) -> Result<&VotingRound, ProposalError> {
        self.status = self.transition(LifecycleStatus::VotingOpen)?;
        let round_number = self.rounds.len() as u32 + 1;
        self.rounds.push(VotingRound {
            proposal_id: self.proposal_id.clone(),
            round_number,
            status: RoundStatus::Open,
            opened_at: now,
            closed_at: None,
        });
        Ok(&self.rounds[self.rounds.len() - 1])
    }

    /// Records an accepted vote against the open round.
    pub fn record_vote(&mut self, record: VoteRecord) -> Result<(), ProposalError> {
        let open = self.open_round().map(|r| r.round_number);
        if open != Some(record.round) {
            return Err(ProposalError::RoundMismatch {
                proposal_id: self.proposal_id.clone(),
                expected: open,
                actual: record.round,
            });
        }
        if self.has_voted(&record.agent_id, record.round) {
            return Err(ProposalError::DuplicateVote {
                proposal_id: self.proposal_id.clone(),
                agent_id: record.agent_id,
            });
        }
        self.status = self.transition(LifecycleStatus::Decided)?;
        self.votes.push(record);
        Ok(())
    }

    /// Closes the open round. Valid once per round.
    pub fn close_round(&mut self, now: Timestamp) -> Result<&VotingRound, ProposalError> {
        self.status = self.transition(LifecycleStatus::VotingClosed)?;
        let index = self.rounds.len() - 1;
        let round = &mut self.rounds[index];
        round.status = RoundStatus::Closed;
        round.closed_at = Some(now);
        Ok(&self.rounds[index])
    }

    pub fn has_voted(&self, agent_id: &AgentId, round_number: u32) -> bool {
        self.votes
            .iter()
            .any(|v| v.round == round_number && &v.agent_id == agent_id)
    }

    /// Checks a transition without applying it.
    pub fn ensure_can_transition(&self, to: LifecycleStatus) -> Result<(), ProposalError> {
        self.transition(to).map(|_| ())
    }

    fn transition(&self, to: LifecycleStatus) -> Result<LifecycleStatus, ProposalError> {
        self.status
            .transition_to(to)
            .map_err(|_| ProposalError::InvalidTransition {
                proposal_id: self.proposal_id.clone(),
                from: self.status,
                to,
            })
    }
}
