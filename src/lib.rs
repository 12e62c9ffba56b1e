//! DAO Sentiment - sentiment-driven voting agents for an on-chain DAO.
//!
//! Community feedback is buffered per agent, scored when a proposal opens
//! for voting, and cast on the ledger as a Yes/No/Abstain vote.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
