// src/conn/envelope.rs

//! Wire format of the event channel.
//!
//! Inbound frames are JSON envelopes:
//!
//! ```json
//! {"type": "log", "timestamp": "2024-05-01T12:00:00", "payload": {...}}
//! ```
//!
//! Only `log` payloads are interpreted here; every other kind is carried as
//! an opaque JSON payload for whoever subscribed to inbound messages.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::conn::JobId;
use crate::logs::LogEvent;
use crate::types::{LogLevel, LogSource};

/// Discriminator of an inbound envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Log,
    Progress,
    Status,
    Complete,
    Error,
    Pong,
}

/// Uninterpreted message body plus its effective timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Passthrough {
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl Passthrough {
    /// `payload.job_id`, when the backend scoped the message to a job.
    pub fn job_id(&self) -> Option<&str> {
        self.payload.get("job_id").and_then(Value::as_str)
    }
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Log(LogEvent),
    Progress(Passthrough),
    Status(Passthrough),
    Complete(Passthrough),
    Error(Passthrough),
    Pong(Passthrough),
}

impl Inbound {
    pub fn kind(&self) -> MessageKind {
        match self {
            Inbound::Log(_) => MessageKind::Log,
            Inbound::Progress(_) => MessageKind::Progress,
            Inbound::Status(_) => MessageKind::Status,
            Inbound::Complete(_) => MessageKind::Complete,
            Inbound::Error(_) => MessageKind::Error,
            Inbound::Pong(_) => MessageKind::Pong,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Inbound::Log(event) => event.timestamp,
            Inbound::Progress(p)
            | Inbound::Status(p)
            | Inbound::Complete(p)
            | Inbound::Error(p)
            | Inbound::Pong(p) => p.timestamp,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            Inbound::Log(event) => event.job_id.as_deref(),
            Inbound::Progress(p)
            | Inbound::Status(p)
            | Inbound::Complete(p)
            | Inbound::Error(p)
            | Inbound::Pong(p) => p.job_id(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct LogPayload {
    level: LogLevel,
    source: LogSource,
    message: String,
    #[serde(default)]
    job_id: Option<JobId>,
}

/// Why an inbound frame was rejected.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not a valid envelope: {0}")]
    Envelope(serde_json::Error),

    #[error("log payload is invalid: {0}")]
    LogPayload(serde_json::Error),
}

/// Out-of-band report about something the manager dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An inbound frame failed to decode and was discarded.
    MalformedFrame { error: String, frame: String },
    /// An outbound control frame could not be written.
    SendFailed { error: String },
}

const MAX_REPORTED_FRAME_LEN: usize = 256;

impl Diagnostic {
    pub(crate) fn malformed(error: &FrameError, frame: &str) -> Self {
        let frame = match frame.char_indices().nth(MAX_REPORTED_FRAME_LEN) {
            Some((cut, _)) => format!("{}...", &frame[..cut]),
            None => frame.to_string(),
        };
        Diagnostic::MalformedFrame {
            error: error.to_string(),
            frame,
        }
    }
}

/// Decode one inbound text frame.
///
/// Envelopes without a timestamp (or with one that does not parse) are
/// stamped with `received_at`.
pub fn decode_frame(text: &str, received_at: DateTime<Utc>) -> Result<Inbound, FrameError> {
    let raw: RawEnvelope = serde_json::from_str(text).map_err(FrameError::Envelope)?;
    let timestamp = parse_timestamp(raw.timestamp.as_deref()).unwrap_or(received_at);

    let passthrough = |payload| Passthrough { timestamp, payload };

    let inbound = match raw.kind {
        MessageKind::Log => {
            let payload: LogPayload =
                serde_json::from_value(raw.payload).map_err(FrameError::LogPayload)?;
            Inbound::Log(LogEvent {
                level: payload.level,
                source: payload.source,
                message: payload.message,
                job_id: payload.job_id,
                timestamp,
            })
        }
        MessageKind::Progress => Inbound::Progress(passthrough(raw.payload)),
        MessageKind::Status => Inbound::Status(passthrough(raw.payload)),
        MessageKind::Complete => Inbound::Complete(passthrough(raw.payload)),
        MessageKind::Error => Inbound::Error(passthrough(raw.payload)),
        MessageKind::Pong => Inbound::Pong(passthrough(raw.payload)),
    };

    Ok(inbound)
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (with offset) and naive `YYYY-MM-DDTHH:MM:SS[.f]`,
/// which the backend emits and which is read as UTC.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Outbound control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ControlFrame {
    Subscribe { job_id: JobId },
    Unsubscribe { job_id: JobId },
    Ping,
}

impl ControlFrame {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
