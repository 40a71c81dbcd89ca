// src/conn/mod.rs

//! Real-time event channel to the pipeline backend.
//!
//! Same split as the rest of the crate: a pure, synchronous state machine
//! ([`core`] + [`event_handlers`]) decides what should happen, and an async
//! shell ([`manager`]) performs the IO through a pluggable [`Transport`].
//!
//! - [`envelope`] decodes inbound frames and encodes outbound control frames.
//! - [`policy`] holds the swappable reconnect policy.
//! - [`transport`] defines the `Transport` trait and the WebSocket transport.
//! - [`identity`] generates the per-session client identifier.

use chrono::{DateTime, Utc};

/// Job identifier used to scope subscriptions.
pub type JobId = String;

/// Connection lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnPhase {
    Disconnected,
    Connecting,
    Connected,
}

/// Events flowing into the connection core, from the handle (requests),
/// the transport, and the reconnect timer.
#[derive(Debug, Clone)]
pub enum ConnEvent {
    /// Caller asked to connect.
    ConnectRequested,
    /// Caller asked to tear the connection down and stop reconnecting.
    DisconnectRequested,
    /// The transport finished its handshake.
    HandshakeCompleted,
    /// The transport could not be opened.
    HandshakeFailed { error: String },
    /// The open transport was closed by the peer or failed.
    TransportClosed { reason: Option<String> },
    /// A text frame arrived on the open transport.
    FrameReceived {
        text: String,
        received_at: DateTime<Utc>,
    },
    /// The pending reconnect delay elapsed.
    ReconnectTimerFired,
    SubscribeRequested { job_id: JobId },
    UnsubscribeRequested { job_id: JobId },
    PingRequested,
    ClearLogsRequested,
    /// Tear down and stop the manager loop.
    ShutdownRequested,
}

pub mod core;
pub mod envelope;
pub mod event_handlers;
pub mod identity;
pub mod manager;
pub mod policy;
pub mod transport;

pub use core::ConnectionCore;
pub use envelope::{ControlFrame, Diagnostic, Inbound, MessageKind, Passthrough};
pub use event_handlers::{ConnCommand, ConnStep};
pub use manager::{ConnectionHandle, ConnectionManager};
pub use policy::{FixedDelay, Immediate, ReconnectPolicy};
pub use transport::{Connection, OpenFuture, Transport, TransportEvent, WsTransport};
