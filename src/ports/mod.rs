//! Ports - interfaces between the application core and the outside world.
//!
//! - `LedgerGateway` - DAO reads and signed transactions
//! - `SentimentScorer` - batch sentiment analysis
//! - `EventPublisher` / `EventSubscriber` - lifecycle event transport

mod event_publisher;
mod event_subscriber;
mod ledger_gateway;
mod sentiment_scorer;

pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use ledger_gateway::{LedgerError, LedgerGateway};
pub use sentiment_scorer::{ScoringError, SentimentScorer};
