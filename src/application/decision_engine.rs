//! Decision engine: scorer call under a timeout, then the threshold policy.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::decision::{to_vote_code, DecisionResult, Thresholds, VoteCode};
use crate::domain::feedback::MessageBatch;
use crate::ports::{ScoringError, SentimentScorer};

use super::retry::RetryPolicy;

pub struct DecisionEngine {
    scorer: Arc<dyn SentimentScorer>,
    thresholds: Thresholds,
    timeout: Duration,
    retry: RetryPolicy,
}

impl DecisionEngine {
    pub fn new(
        scorer: Arc<dyn SentimentScorer>,
        thresholds: Thresholds,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            scorer,
            thresholds,
            timeout,
            retry,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Scores a batch. An empty batch is neutral with zero confidence and
    /// never reaches the scorer.
    pub async fn decide(&self, batch: &MessageBatch) -> Result<DecisionResult, ScoringError> {
        if batch.is_empty() {
            return Ok(DecisionResult::NEUTRAL);
        }

        let result = self
            .retry
            .run("score", || self.score_once(batch))
            .await?;

        tracing::debug!(
            scorer = self.scorer.name(),
            messages = batch.len(),
            score = result.score(),
            confidence = result.confidence(),
            "Batch scored"
        );
        Ok(result)
    }

    /// Maps a result to a vote under the configured thresholds.
    pub fn vote_for(&self, result: &DecisionResult) -> VoteCode {
        to_vote_code(result, &self.thresholds)
    }

    async fn score_once(&self, batch: &MessageBatch) -> Result<DecisionResult, ScoringError> {
        match tokio::time::timeout(self.timeout, self.scorer.score(batch)).await {
            Ok(result) => result,
            Err(_) => Err(ScoringError::unavailable(format!(
                "{} scorer timed out after {}ms",
                self.scorer.name(),
                self.timeout.as_millis()
            ))),
        }
    }
}
