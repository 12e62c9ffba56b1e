//! Bridge from lifecycle events to the dashboard hub.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::domain::proposal::LIFECYCLE_EVENT_TYPES;
use crate::ports::{EventHandler, EventSubscriber};

use super::hub::DashboardHub;
use super::messages::DashboardUpdate;

pub struct DashboardEventBridge {
    hub: Arc<DashboardHub>,
}

impl DashboardEventBridge {
    pub fn new(hub: Arc<DashboardHub>) -> Self {
        Self { hub }
    }

    pub fn new_shared(hub: Arc<DashboardHub>) -> Arc<Self> {
        Arc::new(Self::new(hub))
    }

    /// Subscribes the bridge to every lifecycle event type.
    pub fn register(self: &Arc<Self>, subscriber: &dyn EventSubscriber) {
        subscriber.subscribe_all(LIFECYCLE_EVENT_TYPES, self.clone());
    }
}

#[async_trait]
impl EventHandler for DashboardEventBridge {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let delivered = self.hub.broadcast(DashboardUpdate::from_envelope(&event));
        tracing::trace!(
            event_type = %event.event_type,
            delivered,
            "Forwarded event to dashboard"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DashboardEventBridge"
    }
}
