//! Publishes each event to several publishers in order.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

/// Every publisher is attempted even when an earlier one fails; the
/// failures are then reported together.
pub struct FanoutPublisher {
    publishers: Vec<Arc<dyn EventPublisher>>,
}

impl FanoutPublisher {
    pub fn new(publishers: Vec<Arc<dyn EventPublisher>>) -> Self {
        Self { publishers }
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

#[async_trait]
impl EventPublisher for FanoutPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let mut failures = Vec::new();
        for publisher in &self.publishers {
            if let Err(e) = publisher.publish(event.clone()).await {
                failures.push(e.message);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::EventBusError,
                format!("{} publisher(s) failed: {}", failures.len(), failures.join("; ")),
            ))
        }
    }
}
