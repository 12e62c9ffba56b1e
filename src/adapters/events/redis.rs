//! Redis pub/sub transport for lifecycle events.
//!
//! Lets voting agents run as separate processes. Each process stamps the
//! envelopes it sends with its origin and the relay drops envelopes
//! carrying its own origin, so nothing loops back onto the local bus.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

fn bus_error(context: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::EventBusError, format!("{}: {}", context, err))
}

/// Publishes envelopes as JSON on one channel.
#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: MultiplexedConnection,
    channel: String,
    origin: String,
}

impl RedisEventPublisher {
    pub fn new(conn: MultiplexedConnection, channel: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            conn,
            channel: channel.into(),
            origin: origin.into(),
        }
    }

    pub async fn connect(
        url: &str,
        channel: impl Into<String>,
        origin: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let client = redis::Client::open(url).map_err(|e| bus_error("invalid Redis URL", e))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| bus_error("Redis connection failed", e))?;
        Ok(Self::new(conn, channel, origin))
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let event = event.with_source(self.origin.clone());
        let payload = encode(&event)?;

        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(&self.channel, payload)
            .await
            .map_err(|e| bus_error("Redis publish failed", e))?;

        tracing::debug!(
            channel = %self.channel,
            event_type = %event.event_type,
            "Event published to Redis"
        );
        Ok(())
    }
}

/// Subscribes to the channel and republishes envelopes locally.
pub struct RedisEventRelay {
    client: redis::Client,
    channel: String,
    origin: String,
}

impl RedisEventRelay {
    pub fn new(url: &str, channel: impl Into<String>, origin: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            client: redis::Client::open(url).map_err(|e| bus_error("invalid Redis URL", e))?,
            channel: channel.into(),
            origin: origin.into(),
        })
    }

    /// Relays until `shutdown` flips to true or the connection ends.
    pub async fn run(
        self,
        local: Arc<dyn EventPublisher>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), DomainError> {
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| bus_error("Redis subscribe connection failed", e))?
            .into_pubsub();
        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(|e| bus_error("Redis SUBSCRIBE failed", e))?;
        tracing::info!(channel = %self.channel, "Relaying Redis events");

        let mut messages = pubsub.on_message();
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                message = messages.next() => {
                    let Some(message) = message else {
                        return Err(DomainError::new(
                            ErrorCode::EventBusError,
                            "Redis subscription closed",
                        ));
                    };
                    let payload: String = match message.get_payload() {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(error = %e, "Non-text Redis message skipped");
                            continue;
                        }
                    };
                    self.forward(&payload, local.as_ref()).await;
                }
            }
        }

        tracing::info!(channel = %self.channel, "Redis relay stopped");
        Ok(())
    }

    async fn forward(&self, payload: &str, local: &dyn EventPublisher) {
        let event = match decode(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Undecodable Redis event skipped");
                return;
            }
        };
        if !should_relay(&event, &self.origin) {
            return;
        }
        if let Err(e) = local.publish(event).await {
            tracing::warn!(error = %e, "Local republish failed");
        }
    }
}

fn encode(event: &EventEnvelope) -> Result<String, DomainError> {
    serde_json::to_string(event).map_err(|e| bus_error("event encoding failed", e))
}

fn decode(payload: &str) -> Result<EventEnvelope, DomainError> {
    serde_json::from_str(payload).map_err(|e| bus_error("event decoding failed", e))
}

/// Envelopes this process sent itself are already on the local bus.
fn should_relay(event: &EventEnvelope, origin: &str) -> bool {
    event.metadata.source.as_deref() != Some(origin)
}
