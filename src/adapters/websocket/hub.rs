//! Fan-out of dashboard updates to connected clients.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::broadcast;
use uuid::Uuid;

use super::messages::DashboardUpdate;

/// Updates buffered per slow client before it starts lagging.
pub const DEFAULT_HUB_CAPACITY: usize = 128;

/// Server-assigned identifier for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broadcast channel shared by every dashboard connection.
pub struct DashboardHub {
    sender: broadcast::Sender<DashboardUpdate>,
    connected: AtomicUsize,
}

impl DashboardHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            connected: AtomicUsize::new(0),
        }
    }

    /// Registers a client and returns its update stream.
    pub fn join(&self, client_id: &ClientId) -> broadcast::Receiver<DashboardUpdate> {
        let count = self.connected.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(client_id = %client_id, connected = count, "Dashboard client joined");
        self.sender.subscribe()
    }

    pub fn leave(&self, client_id: &ClientId) {
        let count = self
            .connected
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1);
        tracing::debug!(client_id = %client_id, connected = count, "Dashboard client left");
    }

    /// Sends an update to all clients. Returns how many received it.
    pub fn broadcast(&self, update: DashboardUpdate) -> usize {
        // No receivers is not an error; the dashboard may simply be closed.
        self.sender.send(update).unwrap_or(0)
    }

    pub fn client_count(&self) -> usize {
        self.connected.load(Ordering::Relaxed)
    }
}

impl Default for DashboardHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}
