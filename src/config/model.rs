// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [server]
/// api_url = "http://localhost:8000"
/// ws_url = "ws://localhost:8000"
///
/// [connection]
/// reconnect_delay_ms = 3000
///
/// [logs]
/// capacity = 500
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConsoleConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub connection: ConnectionSection,

    #[serde(default)]
    pub logs: LogsSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConsoleConfig>`.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub server: ServerSection,
    pub connection: ConnectionSection,
    pub logs: LogsSection,
}

impl ConsoleConfig {
    pub(crate) fn new_unchecked(
        server: ServerSection,
        connection: ConnectionSection,
        logs: LogsSection,
    ) -> Self {
        Self {
            server,
            connection,
            logs,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new_unchecked(
            ServerSection::default(),
            ConnectionSection::default(),
            LogsSection::default(),
        )
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Base URL of the REST API (graph and selector endpoints).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL of the event channel. The client connects to
    /// `<ws_url>/ws/<client id>`.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8000".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: default_ws_url(),
        }
    }
}

/// `[connection]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSection {
    /// Fixed delay between a lost connection and the next attempt.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Upper bound on a single handshake attempt.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Capacity of the broadcast channel carrying inbound messages to
    /// subscribers. Slow subscribers lag rather than block the manager.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_event_capacity() -> usize {
    256
}

impl ConnectionSection {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// `[logs]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsSection {
    /// Maximum number of log events retained; oldest are evicted first.
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

fn default_log_capacity() -> usize {
    500
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
        }
    }
}
