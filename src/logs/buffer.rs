// src/logs/buffer.rs

use std::collections::VecDeque;

use crate::logs::event::LogEvent;

/// Number of events retained when no capacity is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Bounded, append-only record of log events.
///
/// Semantics:
/// - events are kept in arrival order;
/// - once `capacity` events are held, each append evicts the oldest one
///   (plain FIFO: error-level events get no special treatment);
/// - no operation blocks or fails.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    capacity: usize,
    events: VecDeque<LogEvent>,
}

impl LogBuffer {
    /// Create an empty buffer. A capacity of 0 is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append one event, evicting the oldest if the buffer is full.
    pub fn append(&mut self, event: LogEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Drop every retained event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Snapshot of the retained events, oldest first.
    pub fn list(&self) -> Vec<LogEvent> {
        self.events.iter().cloned().collect()
    }

    /// Borrowing iterator over the retained events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
