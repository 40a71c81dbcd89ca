// src/conn/core.rs

//! Pure connection state machine.
//!
//! [`ConnectionCore`] consumes [`ConnEvent`]s and returns the commands the
//! async shell (`conn::manager::ConnectionManager`) should execute. It owns
//! no sockets, timers or channels, so every transition can be exercised
//! synchronously in tests.
//!
//! ```text
//! Disconnected --connect--> Connecting --handshake ok--> Connected
//!      ^                        |                            |
//!      |<----handshake failed---+                            |
//!      |<-----------------transport closed / error-----------+
//!      +----reconnect timer (fixed delay, unbounded)----> Connecting
//! ```

use crate::conn::envelope::ControlFrame;
use crate::conn::event_handlers::{
    handle_connect, handle_control, handle_disconnect, handle_frame,
    handle_handshake_completed, handle_handshake_failed, handle_reconnect_timer,
    handle_shutdown, handle_transport_closed, ConnCommand, ConnStep,
};
use crate::conn::policy::ReconnectPolicy;
use crate::conn::{ConnEvent, ConnPhase};

/// Mutable state shared by the event handlers.
#[derive(Debug)]
pub struct CoreState {
    pub(crate) client_id: String,
    pub(crate) endpoint: String,
    pub(crate) phase: ConnPhase,
    /// Cleared by an explicit disconnect; set again by connect.
    pub(crate) auto_reconnect: bool,
    pub(crate) reconnect_pending: bool,
    /// Reconnect attempts since the last successful handshake.
    pub(crate) attempt: u32,
    pub(crate) policy: Box<dyn ReconnectPolicy>,
}

/// Pure core of the connection manager.
#[derive(Debug)]
pub struct ConnectionCore {
    state: CoreState,
}

impl ConnectionCore {
    pub fn new(
        client_id: impl Into<String>,
        endpoint: impl Into<String>,
        policy: Box<dyn ReconnectPolicy>,
    ) -> Self {
        Self {
            state: CoreState {
                client_id: client_id.into(),
                endpoint: endpoint.into(),
                phase: ConnPhase::Disconnected,
                auto_reconnect: false,
                reconnect_pending: false,
                attempt: 0,
                policy,
            },
        }
    }

    pub fn phase(&self) -> ConnPhase {
        self.state.phase
    }

    pub fn is_connected(&self) -> bool {
        self.state.phase == ConnPhase::Connected
    }

    pub fn client_id(&self) -> &str {
        &self.state.client_id
    }

    pub fn endpoint(&self) -> &str {
        &self.state.endpoint
    }

    /// Whether a reconnect timer is currently armed.
    pub fn reconnect_pending(&self) -> bool {
        self.state.reconnect_pending
    }

    /// Handle a single event, updating state and returning the resulting
    /// commands for the IO shell.
    pub fn step(&mut self, event: ConnEvent) -> ConnStep {
        let state = &mut self.state;
        match event {
            ConnEvent::ConnectRequested => handle_connect(state),
            ConnEvent::DisconnectRequested => handle_disconnect(state),
            ConnEvent::HandshakeCompleted => handle_handshake_completed(state),
            ConnEvent::HandshakeFailed { error } => handle_handshake_failed(state, &error),
            ConnEvent::TransportClosed { reason } => {
                handle_transport_closed(state, reason.as_deref())
            }
            ConnEvent::FrameReceived { text, received_at } => handle_frame(&text, received_at),
            ConnEvent::ReconnectTimerFired => handle_reconnect_timer(state),
            ConnEvent::SubscribeRequested { job_id } => {
                handle_control(state, ControlFrame::Subscribe { job_id })
            }
            ConnEvent::UnsubscribeRequested { job_id } => {
                handle_control(state, ControlFrame::Unsubscribe { job_id })
            }
            ConnEvent::PingRequested => handle_control(state, ControlFrame::Ping),
            ConnEvent::ClearLogsRequested => ConnStep {
                commands: vec![ConnCommand::ClearLogs],
                keep_running: true,
            },
            ConnEvent::ShutdownRequested => handle_shutdown(state),
        }
    }
}
