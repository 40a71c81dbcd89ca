// src/conn/transport.rs

//! Pluggable transport abstraction.
//!
//! The manager talks to a `Transport` instead of a raw socket, so tests can
//! drive the full manager loop with a scripted fake while production uses
//! [`WsTransport`].

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::errors::{ConsoleError, Result};

/// Event produced by an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound text frame.
    Frame(String),
    /// The connection ended (peer close, IO error, or stream end).
    Closed { reason: Option<String> },
}

/// Pending handshake. Owns everything it needs, so the manager can keep
/// serving requests while it is in flight and cancel it by dropping it.
pub type OpenFuture = Pin<Box<dyn Future<Output = Result<Connection>> + Send + 'static>>;

/// Trait abstracting the bidirectional event channel.
pub trait Transport: Send {
    /// Start opening a connection to `url` and completing the handshake.
    fn open(&self, url: String) -> OpenFuture;
}

/// One open connection.
///
/// Inbound frames and the final `Closed` event arrive on `recv`; outbound
/// frames are queued with `send` and written by the transport in order.
/// Dropping the connection closes it.
#[derive(Debug)]
pub struct Connection {
    inbound: mpsc::Receiver<TransportEvent>,
    outbound: mpsc::Sender<String>,
    reader: Option<JoinHandle<()>>,
}

impl Connection {
    pub fn new(inbound: mpsc::Receiver<TransportEvent>, outbound: mpsc::Sender<String>) -> Self {
        Self {
            inbound,
            outbound,
            reader: None,
        }
    }

    /// Attach the task feeding `inbound`; it is aborted when the connection
    /// is dropped.
    pub fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.inbound.recv().await
    }

    /// Queue one text frame without waiting.
    pub fn send(&self, text: String) -> Result<()> {
        self.outbound.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => ConsoleError::TransportError("outbound queue is full".into()),
            TrySendError::Closed(_) => ConsoleError::TransportError("connection is closed".into()),
        })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport built on `tokio-tungstenite`.
///
/// Each open connection is split: a writer task drains the outbound queue
/// into the sink and closes it once the [`Connection`] is dropped, and a
/// reader task pumps the read half into the inbound channel.
#[derive(Debug, Clone)]
pub struct WsTransport {
    channel_capacity: usize,
}

impl WsTransport {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Transport for WsTransport {
    fn open(&self, url: String) -> OpenFuture {
        let capacity = self.channel_capacity;
        Box::pin(async move {
            let (stream, _response) = connect_async(url.as_str())
                .await
                .map_err(|e| ConsoleError::TransportError(e.to_string()))?;
            info!(%url, "websocket handshake complete");

            let (sink, read) = stream.split();
            let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
            let (outbound_tx, outbound_rx) = mpsc::channel(capacity);

            tokio::spawn(write_frames(sink, outbound_rx));
            let reader = tokio::spawn(pump_frames(read, inbound_tx));
            Ok(Connection::new(inbound_rx, outbound_tx).with_reader(reader))
        })
    }
}

/// Write queued frames until the queue closes, then close the socket.
async fn write_frames(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::Receiver<String>,
) {
    while let Some(text) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(text)).await {
            warn!(error = %e, "failed to write websocket frame");
            break;
        }
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "error while closing websocket");
    }
}

/// Forward inbound text frames until the connection ends, then emit exactly
/// one `Closed`.
async fn pump_frames(mut read: SplitStream<WsStream>, tx: mpsc::Sender<TransportEvent>) {
    let reason = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                if tx.send(TransportEvent::Frame(text)).await.is_err() {
                    // Manager dropped this connection.
                    return;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                break frame.map(|f| f.reason.to_string());
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => break Some(e.to_string()),
            None => break None,
        }
    };

    let _ = tx.send(TransportEvent::Closed { reason }).await;
}
