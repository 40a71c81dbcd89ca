// src/logs/store.rs

//! Single-writer state container for connection and log state.
//!
//! The connection manager owns the only [`ConsoleStore`]; everything else
//! gets a [`ConsoleReader`], which can observe but never mutate.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

use crate::logs::buffer::LogBuffer;
use crate::logs::event::LogEvent;

/// Writable side of the console state. Not `Clone`: there is one writer.
#[derive(Debug)]
pub struct ConsoleStore {
    client_id: String,
    connected: watch::Sender<bool>,
    logs: Arc<RwLock<LogBuffer>>,
}

impl ConsoleStore {
    pub fn new(client_id: impl Into<String>, log_capacity: usize) -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            client_id: client_id.into(),
            connected,
            logs: Arc::new(RwLock::new(LogBuffer::new(log_capacity))),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn reader(&self) -> ConsoleReader {
        ConsoleReader {
            client_id: self.client_id.clone(),
            connected: self.connected.subscribe(),
            logs: Arc::clone(&self.logs),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn append_log(&self, event: LogEvent) {
        write_logs(&self.logs).append(event);
    }

    /// Empty the buffer under a single write lock, so readers see either the
    /// full previous contents or nothing.
    pub fn clear_logs(&self) {
        write_logs(&self.logs).clear();
    }
}

/// Read-only view of the console state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ConsoleReader {
    client_id: String,
    connected: watch::Receiver<bool>,
    logs: Arc<RwLock<LogBuffer>>,
}

impl ConsoleReader {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// A receiver that resolves whenever the connected flag flips.
    pub fn connected_changes(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    /// Snapshot of the log buffer, oldest first.
    pub fn logs(&self) -> Vec<LogEvent> {
        read_logs(&self.logs).list()
    }

    pub fn log_count(&self) -> usize {
        read_logs(&self.logs).len()
    }
}

// A panic while holding the lock cannot leave the buffer half-updated
// (append/clear are single VecDeque calls), so poisoned locks are recovered.
fn read_logs(logs: &RwLock<LogBuffer>) -> RwLockReadGuard<'_, LogBuffer> {
    logs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_logs(logs: &RwLock<LogBuffer>) -> RwLockWriteGuard<'_, LogBuffer> {
    logs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
