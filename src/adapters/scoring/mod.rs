//! Sentiment scorer adapters.

mod mock_scorer;
mod process_scorer;

pub use mock_scorer::MockScorer;
pub use process_scorer::{parse_output, ProcessScorer};
