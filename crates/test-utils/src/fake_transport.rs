use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use pipeline_console::conn::{Connection, OpenFuture, Transport, TransportEvent};
use pipeline_console::errors::ConsoleError;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Counters the control side can wait on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    pub opens: usize,
    pub sent: usize,
    pub closes: usize,
}

#[derive(Debug, Default)]
struct State {
    open_times: Vec<Instant>,
    urls: Vec<String>,
    sent: Vec<String>,
    fail_next: usize,
    open_delay: Duration,
    generation: u64,
    /// Inbound side of the open connection, tagged with its generation.
    current: Option<(u64, mpsc::Sender<TransportEvent>)>,
}

/// In-memory transport driven by a [`FakeTransportControl`].
///
/// - Every `open` is recorded with the (possibly paused) Tokio clock when it
///   starts.
/// - A handshake takes `open_delay` (zero by default) and then succeeds,
///   unless failures were scripted.
/// - Frames sent on a connection are recorded in order; the connection
///   counts as closed once the manager drops it.
#[derive(Debug)]
pub struct FakeTransport {
    state: Arc<Mutex<State>>,
    activity: Arc<watch::Sender<Activity>>,
}

/// Test-side handle of a [`FakeTransport`].
#[derive(Debug, Clone)]
pub struct FakeTransportControl {
    state: Arc<Mutex<State>>,
    activity: watch::Receiver<Activity>,
}

/// Create a connected transport/control pair.
pub fn fake_transport() -> (FakeTransport, FakeTransportControl) {
    let state = Arc::new(Mutex::new(State::default()));
    let (tx, rx) = watch::channel(Activity::default());
    (
        FakeTransport {
            state: Arc::clone(&state),
            activity: Arc::new(tx),
        },
        FakeTransportControl {
            state,
            activity: rx,
        },
    )
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Transport for FakeTransport {
    fn open(&self, url: String) -> OpenFuture {
        let state = Arc::clone(&self.state);
        let activity = Arc::clone(&self.activity);

        Box::pin(async move {
            let delay = {
                let mut s = lock(&state);
                s.open_times.push(Instant::now());
                s.urls.push(url);
                s.open_delay
            };
            activity.send_modify(|a| a.opens += 1);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let (generation, inbound_rx) = {
                let mut s = lock(&state);
                if s.fail_next > 0 {
                    s.fail_next -= 1;
                    return Err(ConsoleError::TransportError("scripted open failure".into()));
                }
                s.generation += 1;
                let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
                s.current = Some((s.generation, tx));
                (s.generation, rx)
            };

            let (outbound_tx, outbound_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
            tokio::spawn(record_outbound(state, activity, generation, outbound_rx));
            Ok(Connection::new(inbound_rx, outbound_tx))
        })
    }
}

/// Record frames written on one connection until the manager drops it.
async fn record_outbound(
    state: Arc<Mutex<State>>,
    activity: Arc<watch::Sender<Activity>>,
    generation: u64,
    mut outbound: mpsc::Receiver<String>,
) {
    while let Some(text) = outbound.recv().await {
        lock(&state).sent.push(text);
        activity.send_modify(|a| a.sent += 1);
    }

    {
        let mut s = lock(&state);
        if matches!(&s.current, Some((g, _)) if *g == generation) {
            s.current = None;
        }
    }
    activity.send_modify(|a| a.closes += 1);
}

impl FakeTransportControl {
    /// Deliver a text frame on the open connection. Returns `false` when no
    /// connection is open.
    pub fn push_frame(&self, text: impl Into<String>) -> bool {
        match &lock(&self.state).current {
            Some((_, tx)) => tx.try_send(TransportEvent::Frame(text.into())).is_ok(),
            None => false,
        }
    }

    /// Simulate the peer closing the open connection.
    pub fn close_connection(&self, reason: Option<&str>) -> bool {
        match lock(&self.state).current.take() {
            Some((_, tx)) => tx
                .try_send(TransportEvent::Closed {
                    reason: reason.map(str::to_string),
                })
                .is_ok(),
            None => false,
        }
    }

    /// Make the next `n` opens fail.
    pub fn fail_next_opens(&self, n: usize) {
        lock(&self.state).fail_next = n;
    }

    /// Make every following handshake take `delay`.
    pub fn set_open_delay(&self, delay: Duration) {
        lock(&self.state).open_delay = delay;
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).current.is_some()
    }

    pub fn open_attempts(&self) -> usize {
        lock(&self.state).open_times.len()
    }

    pub fn open_times(&self) -> Vec<Instant> {
        lock(&self.state).open_times.clone()
    }

    pub fn urls(&self) -> Vec<String> {
        lock(&self.state).urls.clone()
    }

    pub fn sent_frames(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    /// Sent frames parsed as JSON (unparseable frames become `Null`).
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent_frames()
            .iter()
            .map(|f| serde_json::from_str(f).unwrap_or(Value::Null))
            .collect()
    }

    pub fn activity(&self) -> Activity {
        *self.activity.borrow()
    }

    /// Wait until at least `n` opens have been attempted.
    pub async fn wait_for_opens(&self, n: usize) {
        self.wait_until(|a| a.opens >= n).await;
    }

    /// Wait until at least `n` frames have been sent.
    pub async fn wait_for_sent(&self, n: usize) {
        self.wait_until(|a| a.sent >= n).await;
    }

    /// Wait until at least `n` connections have been dropped by the manager.
    pub async fn wait_for_closes(&self, n: usize) {
        self.wait_until(|a| a.closes >= n).await;
    }

    async fn wait_until(&self, mut done: impl FnMut(&Activity) -> bool) {
        let mut rx = self.activity.clone();
        // The sender lives with the transport; if it is gone, so is the wait.
        let _ = rx.wait_for(|a| done(a)).await;
    }
}
