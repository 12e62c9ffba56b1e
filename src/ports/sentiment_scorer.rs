//! Sentiment Scorer Port - black-box batch analysis.
//!
//! A scorer receives the collected messages of one round and returns a
//! `{score, confidence}` pair. How it arrives at the numbers is opaque.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::decision::DecisionResult;
use crate::domain::feedback::MessageBatch;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Port for sentiment analysis.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    /// Scores a non-empty batch.
    async fn score(&self, batch: &MessageBatch) -> Result<DecisionResult, ScoringError>;

    /// Scorer name for logging.
    fn name(&self) -> &'static str;
}

/// Errors from a scorer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The scorer could not be invoked, failed, or timed out.
    #[error("scorer unavailable: {message}")]
    Unavailable { message: String },

    /// The scorer answered with something other than `{score, confidence}`
    /// in `[0, 1]`.
    #[error("scorer output malformed: {message}")]
    Malformed { message: String },
}

impl ScoringError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable { .. } => ErrorCode::ScoringUnavailable,
            Self::Malformed { .. } => ErrorCode::ScoringMalformed,
        }
    }
}

impl From<ScoringError> for DomainError {
    fn from(err: ScoringError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn SentimentScorer) {}

    #[test]
    fn malformed_output_is_not_retryable() {
        assert!(ScoringError::unavailable("exit 1").is_retryable());
        assert!(!ScoringError::malformed("not json").is_retryable());
    }

    #[test]
    fn codes_map_to_domain_codes() {
        let err: DomainError = ScoringError::malformed("x").into();
        assert_eq!(err.code, ErrorCode::ScoringMalformed);
    }
}
