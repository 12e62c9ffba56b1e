//! Application layer - orchestrates the voting pipeline over the ports.
//!
//! - `LifecycleCoordinator` drives proposals through their rounds
//! - `VotingAgent` decides and votes on `voting_started`
//! - `DecisionEngine` wraps the scorer with a timeout and the policy
//! - `ChatIngress` / `MessageIntake` feed messages and commands in

mod chat_ingress;
mod decision_engine;
mod errors;
mod lifecycle_coordinator;
mod retry;
mod vote_registry;
mod voting_agent;

pub use chat_ingress::{ChatAction, ChatIngress, ChatReply, MessageIntake};
pub use decision_engine::DecisionEngine;
pub use errors::VotingError;
pub use lifecycle_coordinator::{CreatedProposal, LifecycleCoordinator, ManualVote, RoundTransition};
pub use retry::{RetryPolicy, Transient};
pub use vote_registry::{Claim, ClaimState, VoteRegistry};
pub use voting_agent::{VoteOutcome, VotingAgent, AGENT_EVENT_TYPES};
