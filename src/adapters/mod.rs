//! Adapters - Implementations of port interfaces.
//!
//! - `ledger` - Sui JSON-RPC and in-memory ledger gateways
//! - `scoring` - external scorer process and a scripted mock
//! - `events` - event buses (in-memory, channel workers, Redis relay)
//! - `http` - axum routers for the DAO API and chat ingress
//! - `websocket` - dashboard feed

pub mod events;
pub mod http;
pub mod ledger;
pub mod scoring;
pub mod websocket;
