// src/conn/manager.rs

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::conn::core::ConnectionCore;
use crate::conn::envelope::{Diagnostic, Inbound};
use crate::conn::event_handlers::ConnCommand;
use crate::conn::identity::{endpoint_for, generate_client_id};
use crate::conn::policy::ReconnectPolicy;
use crate::conn::transport::{Connection, OpenFuture, Transport, TransportEvent};
use crate::conn::{ConnEvent, JobId};
use crate::errors::{ConsoleError, Result};
use crate::logs::{ConsoleReader, ConsoleStore};

const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Drives the connection core in response to requests, transport events,
/// handshake outcomes and the reconnect timer, and delegates socket IO to a
/// [`Transport`].
///
/// This is a pure IO shell around [`ConnectionCore`]; all lifecycle
/// semantics live in the core. Nothing here awaits the network inline: a
/// handshake in flight is one more branch of the event loop, so requests
/// keep being handled (and control frames dropped) while `Connecting`.
/// The manager is the single writer of the [`ConsoleStore`]; everyone else
/// reads through a [`ConsoleReader`].
pub struct ConnectionManager<T: Transport> {
    core: ConnectionCore,
    transport: T,
    store: ConsoleStore,
    requests: mpsc::Receiver<ConnEvent>,
    /// Handshake in flight, if any.
    opening: Option<OpenFuture>,
    /// The currently open connection, if any.
    connection: Option<Connection>,
    reconnect_at: Option<Instant>,
    publisher: broadcast::Sender<Inbound>,
    diagnostics: broadcast::Sender<Diagnostic>,
    connect_timeout: Duration,
}

impl<T: Transport> fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("core", &self.core)
            .field("opening", &self.opening.is_some())
            .field("connected", &self.connection.is_some())
            .field("reconnect_at", &self.reconnect_at)
            .finish_non_exhaustive()
    }
}

impl<T: Transport + 'static> ConnectionManager<T> {
    /// Build a manager with a freshly generated client id, spawn its loop on
    /// the current Tokio runtime, and return the handle used to drive it.
    ///
    /// The manager starts `Disconnected`; call [`ConnectionHandle::connect`].
    pub fn spawn(
        config: &ConsoleConfig,
        transport: T,
        policy: Box<dyn ReconnectPolicy>,
    ) -> (ConnectionHandle, JoinHandle<()>) {
        let (manager, handle) = Self::new(config, transport, policy);
        let join = tokio::spawn(manager.run());
        (handle, join)
    }

    pub fn new(
        config: &ConsoleConfig,
        transport: T,
        policy: Box<dyn ReconnectPolicy>,
    ) -> (Self, ConnectionHandle) {
        let client_id = generate_client_id();
        let endpoint = endpoint_for(&config.server.ws_url, &client_id);

        let store = ConsoleStore::new(client_id.clone(), config.logs.capacity);
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let (publisher, _) = broadcast::channel(config.connection.event_capacity.max(1));
        let (diagnostics, _) = broadcast::channel(config.connection.event_capacity.max(1));

        let handle = ConnectionHandle {
            requests: request_tx,
            reader: store.reader(),
            publisher: publisher.clone(),
            diagnostics: diagnostics.clone(),
            endpoint: endpoint.clone(),
        };

        let manager = Self {
            core: ConnectionCore::new(client_id, endpoint, policy),
            transport,
            store,
            requests: request_rx,
            opening: None,
            connection: None,
            reconnect_at: None,
            publisher,
            diagnostics,
            connect_timeout: config.connection.connect_timeout(),
        };

        (manager, handle)
    }

    /// Main event loop.
    ///
    /// Runs until a shutdown is requested or every handle has been dropped.
    pub async fn run(mut self) {
        info!(client_id = %self.core.client_id(), "connection manager started");

        loop {
            let event = tokio::select! {
                request = self.requests.recv() => match request {
                    Some(event) => event,
                    None => {
                        debug!("all connection handles dropped");
                        ConnEvent::ShutdownRequested
                    }
                },
                opened = finish_open(&mut self.opening) => {
                    self.opening = None;
                    match opened {
                        Ok(connection) => {
                            self.connection = Some(connection);
                            ConnEvent::HandshakeCompleted
                        }
                        Err(e) => ConnEvent::HandshakeFailed {
                            error: e.to_string(),
                        },
                    }
                },
                transport_event = next_transport_event(&mut self.connection) => {
                    self.translate_transport_event(transport_event)
                },
                _ = sleep_until_deadline(self.reconnect_at) => {
                    self.reconnect_at = None;
                    ConnEvent::ReconnectTimerFired
                },
            };

            if !self.dispatch(event) {
                break;
            }
        }

        self.opening = None;
        self.connection = None;
        self.store.set_connected(false);
        info!(client_id = %self.core.client_id(), "connection manager stopped");
    }

    fn translate_transport_event(&mut self, event: Option<TransportEvent>) -> ConnEvent {
        match event {
            Some(TransportEvent::Frame(text)) => ConnEvent::FrameReceived {
                text,
                received_at: Utc::now(),
            },
            Some(TransportEvent::Closed { reason }) => {
                self.connection = None;
                ConnEvent::TransportClosed { reason }
            }
            None => {
                self.connection = None;
                ConnEvent::TransportClosed { reason: None }
            }
        }
    }

    /// Feed one event through the core and execute its commands in order.
    fn dispatch(&mut self, event: ConnEvent) -> bool {
        let step = self.core.step(event);
        for command in step.commands {
            self.execute_command(command);
        }
        step.keep_running
    }

    fn execute_command(&mut self, command: ConnCommand) {
        match command {
            ConnCommand::OpenTransport { url } => self.start_open(url),
            ConnCommand::CloseTransport => {
                // Dropping cancels a pending handshake and closes an open
                // connection.
                self.opening = None;
                self.connection = None;
            }
            ConnCommand::SendFrame(frame) => {
                let result = frame
                    .to_json()
                    .map_err(ConsoleError::from)
                    .and_then(|text| match &self.connection {
                        Some(connection) => connection.send(text),
                        None => Err(ConsoleError::TransportError("transport is not open".into())),
                    });
                if let Err(e) = result {
                    warn!(?frame, error = %e, "failed to send control frame");
                    let _ = self.diagnostics.send(Diagnostic::SendFailed {
                        error: e.to_string(),
                    });
                }
            }
            ConnCommand::ScheduleReconnect { delay } => {
                self.reconnect_at = Some(Instant::now() + delay);
            }
            ConnCommand::CancelReconnect => {
                self.reconnect_at = None;
            }
            ConnCommand::SetConnected(connected) => {
                self.store.set_connected(connected);
            }
            ConnCommand::AppendLog(event) => {
                self.store.append_log(event);
            }
            ConnCommand::Publish(message) => {
                // No receivers is fine: nobody is interested right now.
                let _ = self.publisher.send(message);
            }
            ConnCommand::Report(diagnostic) => {
                warn!(?diagnostic, "dropping inbound frame");
                let _ = self.diagnostics.send(diagnostic);
            }
            ConnCommand::ClearLogs => {
                self.store.clear_logs();
            }
        }
    }

    /// Replace any previous connection or handshake with a new handshake,
    /// bounded by `connect_timeout`.
    fn start_open(&mut self, url: String) {
        self.connection = None;
        let limit = self.connect_timeout;
        let open = self.transport.open(url);
        self.opening = Some(Box::pin(async move {
            match timeout(limit, open).await {
                Ok(result) => result,
                Err(_) => Err(ConsoleError::TransportError(format!(
                    "handshake timed out after {limit:?}"
                ))),
            }
        }));
    }
}

async fn finish_open(opening: &mut Option<OpenFuture>) -> Result<Connection> {
    match opening {
        Some(open) => open.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn next_transport_event(connection: &mut Option<Connection>) -> Option<TransportEvent> {
    match connection {
        Some(connection) => connection.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Cloneable handle for driving a running [`ConnectionManager`].
///
/// Requests are fire-and-forget: none of these methods fail. Control frames
/// requested while disconnected are dropped, not queued; callers that need a
/// subscription to survive reconnects re-subscribe when
/// [`ConsoleReader::connected_changes`] reports `true` again.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    requests: mpsc::Sender<ConnEvent>,
    reader: ConsoleReader,
    publisher: broadcast::Sender<Inbound>,
    diagnostics: broadcast::Sender<Diagnostic>,
    endpoint: String,
}

impl ConnectionHandle {
    pub fn client_id(&self) -> &str {
        self.reader.client_id()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn reader(&self) -> ConsoleReader {
        self.reader.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.reader.is_connected()
    }

    /// Receive every decoded inbound message from now on.
    pub fn inbound(&self) -> broadcast::Receiver<Inbound> {
        self.publisher.subscribe()
    }

    /// Receive diagnostics about dropped frames and failed sends.
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.diagnostics.subscribe()
    }

    pub async fn connect(&self) {
        self.request(ConnEvent::ConnectRequested).await;
    }

    pub async fn disconnect(&self) {
        self.request(ConnEvent::DisconnectRequested).await;
    }

    pub async fn subscribe(&self, job_id: impl Into<JobId>) {
        self.request(ConnEvent::SubscribeRequested {
            job_id: job_id.into(),
        })
        .await;
    }

    pub async fn unsubscribe(&self, job_id: impl Into<JobId>) {
        self.request(ConnEvent::UnsubscribeRequested {
            job_id: job_id.into(),
        })
        .await;
    }

    pub async fn ping(&self) {
        self.request(ConnEvent::PingRequested).await;
    }

    pub async fn clear_logs(&self) {
        self.request(ConnEvent::ClearLogsRequested).await;
    }

    /// Tear down the connection and stop the manager loop.
    pub async fn shutdown(&self) {
        self.request(ConnEvent::ShutdownRequested).await;
    }

    async fn request(&self, event: ConnEvent) {
        if self.requests.send(event).await.is_err() {
            debug!("connection manager stopped; request dropped");
        }
    }
}
