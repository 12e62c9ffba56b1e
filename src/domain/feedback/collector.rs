//! Bounded message buffer for one voting round.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default number of messages retained per round.
pub const DEFAULT_BUFFER_CAPACITY: usize = 20;

/// Ordered batch of community messages, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageBatch(Vec<String>);

impl MessageBatch {
    pub fn new(messages: Vec<String>) -> Self {
        Self(messages)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }

    /// Appends `other` and keeps only the newest `capacity` messages.
    pub fn merge_bounded(mut self, other: MessageBatch, capacity: usize) -> Self {
        self.0.extend(other.0);
        if self.0.len() > capacity {
            let excess = self.0.len() - capacity;
            self.0.drain(..excess);
        }
        self
    }
}

/// Thread-safe bounded buffer with oldest-first eviction.
///
/// `push` and `drain_and_reset` each hold the lock for a single short
/// operation, so a drain never observes a half-applied push.
#[derive(Debug)]
pub struct MessageCollector {
    capacity: usize,
    buffer: Mutex<VecDeque<String>>,
}

impl MessageCollector {
    /// Creates a collector retaining at most `capacity` messages
    /// (a capacity of zero is raised to one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a message, evicting the oldest when over capacity.
    pub fn push(&self, message: impl Into<String>) {
        let mut buffer = self.lock();
        buffer.push_back(message.into());
        while buffer.len() > self.capacity {
            buffer.pop_front();
        }
    }

    /// Takes the whole buffer, leaving it empty.
    pub fn drain_and_reset(&self) -> MessageBatch {
        let mut buffer = self.lock();
        MessageBatch(std::mem::take(&mut *buffer).into())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the deque inconsistent,
    // so a poisoned lock is recovered rather than propagated.
    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MessageCollector {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}
