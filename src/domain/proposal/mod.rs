//! Proposal module - lifecycle of DAO proposals and their voting rounds.

mod errors;
pub mod events;
mod lifecycle;
mod record;
mod vote;

pub use errors::ProposalError;
pub use events::{
    proposals_envelope, ProposalCreated, VoteSubmitted, VotingClosed, VotingStarted,
    LIFECYCLE_EVENT_TYPES,
};
pub use lifecycle::{LifecycleStatus, ProposalLifecycle, RoundStatus, VotingRound};
pub use record::{
    DaoState, ProposalDraft, ProposalRecord, TransactionReceipt, MAX_DESCRIPTION_LEN,
    MAX_TITLE_LEN,
};
pub use vote::{Ballot, VoteRecord};
