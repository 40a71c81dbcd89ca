// src/logs/event.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LogLevel, LogSource};

/// One log line received from the pipeline backend.
///
/// Immutable once created. The `timestamp` is informational only: display
/// order is arrival order, never timestamp order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub source: LogSource,
    pub message: String,
    pub job_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:<7}] {:<16}",
            self.timestamp.format("%H:%M:%S"),
            self.level,
            self.source
        )?;
        if let Some(job) = &self.job_id {
            write!(f, " ({job})")?;
        }
        write!(f, " {}", self.message)
    }
}
