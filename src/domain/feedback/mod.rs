//! Feedback module - community messages feeding the sentiment scorer.

mod chat;
mod collector;

pub use chat::{
    ChatCommand, ChatInput, END_VOTE_USAGE, PROPOSAL_USAGE, UNKNOWN_COMMAND_USAGE, VOTE_USAGE,
};
pub use collector::{MessageBatch, MessageCollector, DEFAULT_BUFFER_CAPACITY};
