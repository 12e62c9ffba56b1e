//! Mock sentiment scorer for testing.
//!
//! Returns queued results in order, then a default. Records every batch it
//! was asked to score.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::decision::DecisionResult;
use crate::domain::feedback::MessageBatch;
use crate::ports::{ScoringError, SentimentScorer};

#[derive(Debug, Clone)]
pub struct MockScorer {
    responses: Arc<Mutex<VecDeque<Result<DecisionResult, ScoringError>>>>,
    default: DecisionResult,
    delay: Duration,
    calls: Arc<Mutex<Vec<MessageBatch>>>,
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScorer {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            default: DecisionResult::NEUTRAL,
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers every call not covered by the queue with `result`.
    pub fn always(mut self, result: DecisionResult) -> Self {
        self.default = result;
        self
    }

    pub fn with_result(self, result: DecisionResult) -> Self {
        lock(&self.responses).push_back(Ok(result));
        self
    }

    pub fn with_error(self, error: ScoringError) -> Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Batches received, in call order.
    pub fn batches(&self) -> Vec<MessageBatch> {
        lock(&self.calls).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl SentimentScorer for MockScorer {
    async fn score(&self, batch: &MessageBatch) -> Result<DecisionResult, ScoringError> {
        lock(&self.calls).push(batch.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        lock(&self.responses)
            .pop_front()
            .unwrap_or(Ok(self.default))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
