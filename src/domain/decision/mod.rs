//! Decision module - pure vote policy.
//!
//! Everything here is deterministic; the scorer call and its timeout live
//! in the application layer's `DecisionEngine`.

mod policy;
mod vote_code;

pub use policy::{to_vote_code, DecisionResult, Thresholds};
pub use vote_code::{VoteCode, VoteCodeMapping};
