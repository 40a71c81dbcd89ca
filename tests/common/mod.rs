#![allow(dead_code)]

pub use pipeline_console_test_utils::builders;
pub use pipeline_console_test_utils::fake_api;
pub use pipeline_console_test_utils::fake_transport;
pub use pipeline_console_test_utils::{init_tracing, with_timeout};

use std::time::Duration;

use pipeline_console::config::ConsoleConfig;
use pipeline_console::conn::{ConnectionHandle, ConnectionManager, FixedDelay};
use tokio::task::JoinHandle;

use crate::common::fake_transport::{fake_transport, FakeTransportControl};

pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Spawn a manager over a fake transport with the default 3s reconnect
/// delay and the given log capacity.
pub fn spawn_fake_manager(
    log_capacity: usize,
) -> (ConnectionHandle, FakeTransportControl, JoinHandle<()>) {
    let mut cfg = ConsoleConfig::default();
    cfg.logs.capacity = log_capacity;

    let (transport, control) = fake_transport();
    let (handle, join) =
        ConnectionManager::spawn(&cfg, transport, Box::new(FixedDelay(RECONNECT_DELAY)));
    (handle, control, join)
}

/// Wait until the connected flag equals `expected`.
pub async fn wait_connected(handle: &ConnectionHandle, expected: bool) {
    let mut rx = handle.reader().connected_changes();
    with_timeout(rx.wait_for(|c| *c == expected))
        .await
        .expect("connection manager stopped");
}

pub fn log_frame(message: &str) -> String {
    serde_json::json!({
        "type": "log",
        "timestamp": "2024-05-01T12:00:00",
        "payload": { "level": "info", "source": "dlt", "message": message }
    })
    .to_string()
}
