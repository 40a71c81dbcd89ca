// tests/connection_manager.rs
//
// Full manager loop over the fake transport. Time is paused, so reconnect
// delays are exact and cost nothing.

mod common;

use std::time::Duration;

use serde_json::json;
use tokio::time::{timeout, Instant};

use pipeline_console::conn::{Diagnostic, Inbound, MessageKind};
use pipeline_console::types::LogSource;

use crate::common::{
    init_tracing, log_frame, spawn_fake_manager, wait_connected, with_timeout, RECONNECT_DELAY,
};

/// Tolerance for the timer wheel's millisecond rounding.
const SLACK: Duration = Duration::from_millis(5);

fn assert_delay(actual: Duration) {
    assert!(
        actual >= RECONNECT_DELAY && actual <= RECONNECT_DELAY + SLACK,
        "expected a reconnect after {RECONNECT_DELAY:?}, got {actual:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn connects_to_client_scoped_endpoint() {
    init_tracing();
    let (handle, control, join) = spawn_fake_manager(500);

    assert!(!handle.is_connected());
    handle.connect().await;
    wait_connected(&handle, true).await;

    let urls = control.urls();
    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0], handle.endpoint());
    assert!(
        urls[0].starts_with("ws://localhost:8000/ws/client-"),
        "unexpected endpoint {}",
        urls[0]
    );
    assert!(handle.client_id().starts_with("client-"));

    handle.shutdown().await;
    with_timeout(join).await.unwrap();
    with_timeout(control.wait_for_closes(1)).await;
    assert!(!control.is_open());
}

#[tokio::test(start_paused = true)]
async fn reconnects_three_seconds_after_peer_close() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);

    handle.connect().await;
    wait_connected(&handle, true).await;

    assert!(control.close_connection(Some("server restart")));
    wait_connected(&handle, false).await;

    with_timeout(control.wait_for_opens(2)).await;
    wait_connected(&handle, true).await;

    let times = control.open_times();
    assert_delay(times[1] - times[0]);
}

#[tokio::test(start_paused = true)]
async fn retries_failed_handshakes_at_a_fixed_interval() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);
    control.fail_next_opens(3);

    handle.connect().await;
    timeout(Duration::from_secs(60), control.wait_for_opens(4))
        .await
        .expect("manager never retried");
    wait_connected(&handle, true).await;

    let times = control.open_times();
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        assert_delay(pair[1] - pair[0]);
    }
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_pending_reconnect() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);

    handle.connect().await;
    wait_connected(&handle, true).await;

    control.close_connection(None);
    handle.disconnect().await;

    tokio::time::sleep(RECONNECT_DELAY * 5).await;

    assert_eq!(control.open_attempts(), 1);
    assert!(!handle.is_connected());
}

#[tokio::test(start_paused = true)]
async fn explicit_connect_after_disconnect_reconnects() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);

    handle.connect().await;
    wait_connected(&handle, true).await;
    handle.disconnect().await;
    wait_connected(&handle, false).await;

    handle.connect().await;
    wait_connected(&handle, true).await;
    assert_eq!(control.open_attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn subscribe_while_disconnected_sends_nothing() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);

    handle.subscribe("job-1").await;
    handle.ping().await;

    // Requests are handled in order, so both were dropped before this.
    handle.connect().await;
    wait_connected(&handle, true).await;

    assert!(control.sent_frames().is_empty());
}

#[tokio::test(start_paused = true)]
async fn control_frames_use_the_action_protocol() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);

    handle.connect().await;
    wait_connected(&handle, true).await;

    handle.subscribe("job-1").await;
    handle.unsubscribe("job-1").await;
    handle.ping().await;
    with_timeout(control.wait_for_sent(3)).await;

    assert_eq!(
        control.sent_json(),
        vec![
            json!({ "action": "subscribe", "job_id": "job-1" }),
            json!({ "action": "unsubscribe", "job_id": "job-1" }),
            json!({ "action": "ping" }),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn log_frames_are_buffered_and_published() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);
    let mut inbound = handle.inbound();

    handle.connect().await;
    wait_connected(&handle, true).await;

    assert!(control.push_frame(log_frame("extracting trips")));
    let message = with_timeout(inbound.recv()).await.unwrap();

    let Inbound::Log(event) = message else {
        panic!("expected a log message, got {message:?}");
    };
    assert_eq!(event.message, "extracting trips");
    assert_eq!(event.source, LogSource::PipelineLoader);

    let logs = handle.reader().logs();
    assert_eq!(logs, vec![event]);
}

#[tokio::test(start_paused = true)]
async fn non_log_messages_are_published_but_not_buffered() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);
    let mut inbound = handle.inbound();

    handle.connect().await;
    wait_connected(&handle, true).await;

    control.push_frame(
        json!({ "type": "progress", "payload": { "job_id": "job-1", "percent": 40 } }).to_string(),
    );
    let message = with_timeout(inbound.recv()).await.unwrap();

    assert_eq!(message.kind(), MessageKind::Progress);
    assert_eq!(message.job_id(), Some("job-1"));
    assert_eq!(handle.reader().log_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_frame_is_dropped_and_reported() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);
    let mut diagnostics = handle.diagnostics();

    handle.connect().await;
    wait_connected(&handle, true).await;

    control.push_frame("this is not json");
    let diagnostic = with_timeout(diagnostics.recv()).await.unwrap();

    match diagnostic {
        Diagnostic::MalformedFrame { frame, .. } => assert_eq!(frame, "this is not json"),
        other => panic!("unexpected diagnostic {other:?}"),
    }
    assert!(handle.is_connected());
    assert_eq!(handle.reader().log_count(), 0);
    assert_eq!(control.open_attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn buffer_keeps_only_the_most_recent_logs() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(3);
    let mut inbound = handle.inbound();

    handle.connect().await;
    wait_connected(&handle, true).await;

    for n in 0..5 {
        control.push_frame(log_frame(&format!("line {n}")));
    }
    for _ in 0..5 {
        with_timeout(inbound.recv()).await.unwrap();
    }

    let messages: Vec<String> = handle
        .reader()
        .logs()
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(messages, vec!["line 2", "line 3", "line 4"]);

    handle.clear_logs().await;
    handle.ping().await;
    with_timeout(control.wait_for_sent(1)).await;
    assert_eq!(handle.reader().log_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn logs_survive_reconnects() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);
    let mut inbound = handle.inbound();

    handle.connect().await;
    wait_connected(&handle, true).await;
    control.push_frame(log_frame("before"));
    with_timeout(inbound.recv()).await.unwrap();

    control.close_connection(None);
    wait_connected(&handle, false).await;
    wait_connected(&handle, true).await;

    control.push_frame(log_frame("after"));
    with_timeout(inbound.recv()).await.unwrap();

    let messages: Vec<String> = handle
        .reader()
        .logs()
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(messages, vec!["before", "after"]);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_the_manager() {
    init_tracing();
    let (handle, control, join) = spawn_fake_manager(500);

    handle.connect().await;
    wait_connected(&handle, true).await;
    drop(handle);

    with_timeout(join).await.unwrap();
    with_timeout(control.wait_for_closes(1)).await;
    assert!(!control.is_open());
}

#[tokio::test(start_paused = true)]
async fn control_frames_during_handshake_are_dropped() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);
    control.set_open_delay(Duration::from_secs(1));

    handle.connect().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_connected());

    handle.subscribe("job-1").await;
    handle.ping().await;
    wait_connected(&handle, true).await;

    // Anything requested while connecting is gone; later requests go out.
    handle.unsubscribe("job-2").await;
    with_timeout(control.wait_for_sent(1)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        control.sent_json(),
        vec![json!({ "action": "unsubscribe", "job_id": "job-2" })]
    );
}

#[tokio::test(start_paused = true)]
async fn requests_are_served_while_handshake_is_pending() {
    init_tracing();
    let (handle, control, join) = spawn_fake_manager(500);
    control.set_open_delay(Duration::from_secs(5));

    handle.connect().await;
    with_timeout(control.wait_for_opens(1)).await;

    let started = Instant::now();
    handle.shutdown().await;
    with_timeout(join).await.unwrap();

    assert!(Instant::now() - started < Duration::from_secs(1));
    assert!(!handle.is_connected());
    assert!(!control.is_open());
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_pending_handshake() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);
    control.set_open_delay(Duration::from_secs(1));

    handle.connect().await;
    with_timeout(control.wait_for_opens(1)).await;
    handle.disconnect().await;

    tokio::time::sleep(RECONNECT_DELAY * 3).await;

    assert!(!handle.is_connected());
    assert!(!control.is_open());
    assert_eq!(control.open_attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_handshake_times_out_and_retries() {
    init_tracing();
    let (handle, control, _join) = spawn_fake_manager(500);
    control.set_open_delay(Duration::from_secs(60));

    handle.connect().await;
    timeout(Duration::from_secs(60), control.wait_for_opens(2))
        .await
        .expect("manager never retried");

    // Default connect timeout (10s) plus the reconnect delay.
    let times = control.open_times();
    let gap = times[1] - times[0];
    let expected = Duration::from_secs(10) + RECONNECT_DELAY;
    assert!(
        gap >= expected && gap <= expected + SLACK * 2,
        "expected a retry after {expected:?}, got {gap:?}"
    );
    assert!(!handle.is_connected());
}
