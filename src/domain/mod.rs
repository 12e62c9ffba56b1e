//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, events, errors)
//! - `proposal` - Proposal lifecycle, voting rounds and vote records
//! - `feedback` - Community message collection and chat command parsing
//! - `decision` - Pure sentiment-to-vote policy

pub mod decision;
pub mod feedback;
pub mod foundation;
pub mod proposal;
