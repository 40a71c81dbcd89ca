// src/conn/event_handlers.rs

//! Event handling logic for the connection core.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::conn::core::CoreState;
use crate::conn::envelope::{decode_frame, ControlFrame, Diagnostic, Inbound};
use crate::conn::ConnPhase;
use crate::logs::LogEvent;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnCommand {
    /// Open the transport to this URL and report the handshake outcome.
    OpenTransport { url: String },
    /// Close the open transport, if any.
    CloseTransport,
    /// Write a control frame to the open transport.
    SendFrame(ControlFrame),
    /// Arm the reconnect timer.
    ScheduleReconnect { delay: Duration },
    /// Disarm the reconnect timer.
    CancelReconnect,
    /// Publish the connected flag to readers.
    SetConnected(bool),
    /// Append to the log buffer.
    AppendLog(LogEvent),
    /// Forward a decoded message to inbound subscribers.
    Publish(Inbound),
    /// Emit a diagnostic for something that was dropped.
    Report(Diagnostic),
    /// Empty the log buffer.
    ClearLogs,
}

/// Decision returned by the core after handling a single `ConnEvent`.
#[derive(Debug, Clone, Default)]
pub struct ConnStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<ConnCommand>,
    /// Whether the outer manager loop should keep running.
    pub keep_running: bool,
}

impl ConnStep {
    fn running(commands: Vec<ConnCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a connect request.
///
/// No-op while connected or connecting. From `Disconnected` this re-enables
/// automatic reconnection, short-circuits any pending reconnect timer and
/// opens the transport right away.
pub fn handle_connect(state: &mut CoreState) -> ConnStep {
    if state.phase != ConnPhase::Disconnected {
        debug!(phase = ?state.phase, "connect requested while not disconnected; ignoring");
        return ConnStep::running(Vec::new());
    }

    let mut commands = Vec::new();
    state.auto_reconnect = true;
    if state.reconnect_pending {
        state.reconnect_pending = false;
        commands.push(ConnCommand::CancelReconnect);
    }
    commands.push(begin_connecting(state));
    ConnStep::running(commands)
}

/// Handle an explicit teardown.
///
/// After this no reconnect happens until the next connect request.
pub fn handle_disconnect(state: &mut CoreState) -> ConnStep {
    let mut commands = Vec::new();
    state.auto_reconnect = false;

    if state.reconnect_pending {
        state.reconnect_pending = false;
        commands.push(ConnCommand::CancelReconnect);
    }

    if state.phase != ConnPhase::Disconnected {
        info!(client_id = %state.client_id, "disconnecting");
        state.phase = ConnPhase::Disconnected;
        commands.push(ConnCommand::CloseTransport);
        commands.push(ConnCommand::SetConnected(false));
    }

    ConnStep::running(commands)
}

pub fn handle_handshake_completed(state: &mut CoreState) -> ConnStep {
    if state.phase != ConnPhase::Connecting {
        // Torn down while the handshake was in flight.
        debug!(phase = ?state.phase, "handshake completed outside Connecting; closing");
        return ConnStep::running(vec![ConnCommand::CloseTransport]);
    }

    info!(client_id = %state.client_id, url = %state.endpoint, "connected");
    state.phase = ConnPhase::Connected;
    state.attempt = 0;
    ConnStep::running(vec![ConnCommand::SetConnected(true)])
}

pub fn handle_handshake_failed(state: &mut CoreState, error: &str) -> ConnStep {
    if state.phase != ConnPhase::Connecting {
        return ConnStep::running(Vec::new());
    }

    warn!(url = %state.endpoint, %error, "connection attempt failed");
    state.phase = ConnPhase::Disconnected;
    ConnStep::running(schedule_reconnect(state).into_iter().collect())
}

pub fn handle_transport_closed(state: &mut CoreState, reason: Option<&str>) -> ConnStep {
    if state.phase == ConnPhase::Disconnected {
        return ConnStep::running(Vec::new());
    }

    info!(client_id = %state.client_id, reason = reason.unwrap_or("none"), "connection closed");
    state.phase = ConnPhase::Disconnected;

    let mut commands = vec![ConnCommand::SetConnected(false)];
    commands.extend(schedule_reconnect(state));
    ConnStep::running(commands)
}

pub fn handle_reconnect_timer(state: &mut CoreState) -> ConnStep {
    if !state.reconnect_pending {
        // Cancelled after the timer had already fired.
        return ConnStep::running(Vec::new());
    }
    state.reconnect_pending = false;

    if state.phase != ConnPhase::Disconnected || !state.auto_reconnect {
        return ConnStep::running(Vec::new());
    }

    debug!(attempt = state.attempt, "reconnect timer fired");
    ConnStep::running(vec![begin_connecting(state)])
}

/// Decode one inbound frame.
///
/// `log` messages go to the buffer and then to subscribers; other kinds go
/// to subscribers only. Malformed frames are reported and dropped without
/// touching the connection phase.
pub fn handle_frame(text: &str, received_at: DateTime<Utc>) -> ConnStep {
    let commands = match decode_frame(text, received_at) {
        Ok(Inbound::Log(event)) => vec![
            ConnCommand::AppendLog(event.clone()),
            ConnCommand::Publish(Inbound::Log(event)),
        ],
        Ok(other) => vec![ConnCommand::Publish(other)],
        Err(err) => vec![ConnCommand::Report(Diagnostic::malformed(&err, text))],
    };
    ConnStep::running(commands)
}

/// Send a control frame if connected; otherwise drop it silently.
///
/// Best-effort only: nothing is queued for a later connection.
pub fn handle_control(state: &CoreState, frame: ControlFrame) -> ConnStep {
    if state.phase != ConnPhase::Connected {
        debug!(?frame, phase = ?state.phase, "not connected; dropping control frame");
        return ConnStep::running(Vec::new());
    }
    ConnStep::running(vec![ConnCommand::SendFrame(frame)])
}

pub fn handle_shutdown(state: &mut CoreState) -> ConnStep {
    let mut step = handle_disconnect(state);
    step.keep_running = false;
    step
}

fn begin_connecting(state: &mut CoreState) -> ConnCommand {
    state.phase = ConnPhase::Connecting;
    debug!(url = %state.endpoint, "opening transport");
    ConnCommand::OpenTransport {
        url: state.endpoint.clone(),
    }
}

fn schedule_reconnect(state: &mut CoreState) -> Option<ConnCommand> {
    if !state.auto_reconnect {
        return None;
    }

    state.attempt = state.attempt.saturating_add(1);
    let delay = state.policy.delay(state.attempt);
    state.reconnect_pending = true;

    info!(
        attempt = state.attempt,
        delay_ms = delay.as_millis() as u64,
        "scheduling reconnect"
    );
    Some(ConnCommand::ScheduleReconnect { delay })
}
