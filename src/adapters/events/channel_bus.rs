//! Asynchronous in-process event bus.
//!
//! Every subscription owns a bounded queue drained by its own task, so
//! events reach each subscriber in publish order while a slow subscriber
//! never stalls the others. A full queue applies back-pressure to the
//! publisher. Handler failures are logged and dropped.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

/// Default queue depth per subscription.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

pub struct ChannelEventBus {
    routes: RwLock<HashMap<String, Vec<mpsc::Sender<EventEnvelope>>>>,
    capacity: usize,
}

impl ChannelEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Number of subscriptions receiving `event_type`.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        read(&self.routes).get(event_type).map_or(0, Vec::len)
    }

    /// Creates a queue and the worker that feeds `handler` from it.
    ///
    /// Must be called inside a Tokio runtime.
    fn spawn_worker(&self, handler: Arc<dyn EventHandler>) -> mpsc::Sender<EventEnvelope> {
        let (tx, mut rx) = mpsc::channel::<EventEnvelope>(self.capacity);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let event_type = event.event_type.clone();
                let aggregate_id = event.aggregate_id.clone();
                if let Err(e) = handler.handle(event).await {
                    tracing::warn!(
                        handler = handler.name(),
                        event_type = %event_type,
                        aggregate_id = %aggregate_id,
                        error = %e,
                        "Event handler failed"
                    );
                }
            }
            tracing::debug!(handler = handler.name(), "Event worker stopped");
        });

        tx
    }
}

impl Default for ChannelEventBus {
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
impl EventPublisher for ChannelEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let senders = read(&self.routes)
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        for sender in senders {
            if sender.send(event.clone()).await.is_err() {
                tracing::warn!(event_type = %event.event_type, "Subscriber queue closed");
            }
        }
        Ok(())
    }
}

impl EventSubscriber for ChannelEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.subscribe_all(&[event_type], handler);
    }

    /// One queue serves all listed types, so the handler sees them in
    /// publish order.
    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        let sender = self.spawn_worker(handler);
        let mut routes = write(&self.routes);
        for event_type in event_types {
            routes
                .entry(event_type.to_string())
                .or_default()
                .push(sender.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Recorder(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
            self.0.lock().unwrap().push(event.event_type);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "Recorder"
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "nope"))
        }
        fn name(&self) -> &'static str {
            "Failing"
        }
    }

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, "1", "Proposal", json!({}))
    }

    async fn wait_for_len(seen: &Arc<Mutex<Vec<String>>>, len: usize) {
        for _ in 0..100 {
            if seen.lock().unwrap().len() >= len {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} events, saw {:?}", len, seen.lock().unwrap());
    }

    #[tokio::test]
    async fn subscriber_sees_types_in_publish_order() {
        let bus = ChannelEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe_all(&["a", "b"], Arc::new(Recorder(seen.clone())));

        bus.publish(envelope("a")).await.unwrap();
        bus.publish(envelope("b")).await.unwrap();
        bus.publish(envelope("a")).await.unwrap();

        wait_for_len(&seen, 3).await;
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn failing_handler_does_not_affect_others() {
        let bus = ChannelEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("a", Arc::new(Failing));
        bus.subscribe("a", Arc::new(Recorder(seen.clone())));

        assert!(bus.publish(envelope("a")).await.is_ok());
        wait_for_len(&seen, 1).await;
        assert_eq!(bus.subscriber_count("a"), 2);
    }

    #[tokio::test]
    async fn unsubscribed_types_are_dropped() {
        let bus = ChannelEventBus::new();
        assert!(bus.publish(envelope("nobody")).await.is_ok());
        assert_eq!(bus.subscriber_count("nobody"), 0);
    }
}
