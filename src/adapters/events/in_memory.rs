//! Synchronous in-process event bus.
//!
//! Handlers run inline inside `publish`, in subscription order, so tests
//! can assert on their effects as soon as `publish` returns. Every envelope
//! is also captured for inspection.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

type HandlerMap = HashMap<String, Vec<Arc<dyn EventHandler>>>;

/// Capturing event bus with inline delivery.
pub struct InMemoryEventBus {
    handlers: RwLock<HandlerMap>,
    published: RwLock<Vec<EventEnvelope>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            published: RwLock::new(Vec::new()),
        }
    }

    /// Every envelope published so far, in order.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        read(&self.published).clone()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        read(&self.published)
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Decoded payloads of every event of `event_type`.
    ///
    /// Envelopes whose payload does not decode as `T` are skipped.
    pub fn payloads_of<T: for<'de> Deserialize<'de>>(&self, event_type: &str) -> Vec<T> {
        self.events_of_type(event_type)
            .iter()
            .filter_map(|e| e.payload_as::<T>().ok())
            .collect()
    }

    pub fn events_for_aggregate(&self, aggregate_id: &str) -> Vec<EventEnvelope> {
        read(&self.published)
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect()
    }

    pub fn event_count(&self) -> usize {
        read(&self.published).len()
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        read(&self.published)
            .iter()
            .any(|e| e.event_type == event_type)
    }

    pub fn clear(&self) {
        write(&self.published).clear();
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        write(&self.published).push(event.clone());

        // Clone handlers so no lock is held across await points
        let handlers: Vec<Arc<dyn EventHandler>> = read(&self.handlers)
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        let mut errors = Vec::new();
        for handler in handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::new(
                ErrorCode::EventBusError,
                format!("Handler errors: {}", errors.join(", ")),
            ));
        }
        Ok(())
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        write(&self.handlers)
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        let mut handlers = write(&self.handlers);
        for event_type in event_types {
            handlers
                .entry(event_type.to_string())
                .or_default()
                .push(Arc::clone(&handler));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::proposal::events::{VOTE_SUBMITTED, VOTING_CLOSED, VOTING_STARTED};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn envelope(event_type: &str, proposal: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, proposal, "Proposal", json!({"proposalId": proposal}))
    }

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "boom"))
        }
        fn name(&self) -> &'static str {
            "FailingHandler"
        }
    }

    #[tokio::test]
    async fn captures_events_by_type_and_aggregate() {
        let bus = InMemoryEventBus::new();
        bus.publish(envelope(VOTING_STARTED, "1")).await.unwrap();
        bus.publish(envelope(VOTE_SUBMITTED, "1")).await.unwrap();
        bus.publish(envelope(VOTING_STARTED, "2")).await.unwrap();

        assert_eq!(bus.event_count(), 3);
        assert_eq!(bus.events_of_type(VOTING_STARTED).len(), 2);
        assert_eq!(bus.events_for_aggregate("1").len(), 2);
        assert!(!bus.has_event(VOTING_CLOSED));

        bus.clear();
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn payloads_decode_into_typed_values() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Minimal {
            proposal_id: String,
        }

        let bus = InMemoryEventBus::new();
        bus.publish(envelope(VOTING_STARTED, "7")).await.unwrap();

        let payloads: Vec<Minimal> = bus.payloads_of(VOTING_STARTED);
        assert_eq!(payloads[0].proposal_id, "7");
    }

    #[tokio::test]
    async fn subscribe_all_delivers_only_listed_types() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe_all(
            &[VOTING_STARTED, VOTING_CLOSED],
            Arc::new(CountingHandler(counter.clone())),
        );

        bus.publish(envelope(VOTING_STARTED, "1")).await.unwrap();
        bus.publish(envelope(VOTE_SUBMITTED, "1")).await.unwrap();
        bus.publish(envelope(VOTING_CLOSED, "1")).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn handler_errors_are_reported_after_all_handlers_ran() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe(VOTING_STARTED, Arc::new(FailingHandler));
        bus.subscribe(VOTING_STARTED, Arc::new(CountingHandler(counter.clone())));

        let err = bus.publish(envelope(VOTING_STARTED, "1")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::EventBusError);
        assert!(err.message.contains("FailingHandler"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
