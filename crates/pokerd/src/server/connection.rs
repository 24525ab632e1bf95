//! Connection handler for individual WebSocket clients.
//!
//! Each client connection gets its own `ConnectionHandler` that:
//! - Performs the WebSocket handshake
//! - Registers the connection (and its outbox) with the coordinator
//! - Decodes incoming frames and dispatches them to the coordinator
//! - Runs a writer task draining the outbox onto the socket
//! - Reports the disconnect when the socket goes away
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Connection errors are logged and result in graceful disconnect

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async_with_config, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use poker_core::ConnectionId;
use poker_protocol::{decode_inbound, encode_outbound, OutboundEvent, MAX_FRAME_SIZE};

use crate::coordinator::{CoordinatorError, CoordinatorHandle};

/// Time allowed for the WebSocket handshake (10 seconds)
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Read timeout for idle connections (10 minutes)
pub const READ_TIMEOUT: Duration = Duration::from_secs(600);

/// Write timeout (10 seconds)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest message the WebSocket layer buffers (256 KiB).
///
/// Messages above [`MAX_FRAME_SIZE`] but within this limit are dropped by
/// the decoder and the connection stays open. Anything larger makes
/// tungstenite fail the read, which closes the connection.
pub const MAX_MESSAGE_SIZE: usize = 4 * MAX_FRAME_SIZE;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsStream = SplitStream<WebSocketStream<TcpStream>>;

/// Connection handler for a single client.
///
/// Manages the lifecycle of a client connection including:
/// - WebSocket handshake
/// - Frame processing loop
/// - Outbound event delivery
/// - Graceful shutdown
pub struct ConnectionHandler {
    /// Accepted TCP socket, upgraded during `run`
    stream: TcpStream,

    /// Remote address, for logging
    peer: SocketAddr,

    /// Transport-assigned connection id
    connection_id: ConnectionId,

    /// Handle to the room coordinator
    coordinator: CoordinatorHandle,

    /// Cancelled on server shutdown
    cancel_token: CancellationToken,
}

impl ConnectionHandler {
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - Accepted TCP socket
    /// * `peer` - Remote address of the socket
    /// * `connection_id` - Unique id assigned by the server
    /// * `coordinator` - Handle to the room coordinator
    /// * `cancel_token` - Token for graceful shutdown
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        connection_id: ConnectionId,
        coordinator: CoordinatorHandle,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            stream,
            peer,
            connection_id,
            coordinator,
            cancel_token,
        }
    }

    /// Runs the connection handler.
    ///
    /// Performs the handshake, registers with the coordinator, then processes
    /// frames until the socket closes. Returns when the connection is done;
    /// the coordinator has been told about the disconnect by then.
    pub async fn run(self) -> Result<(), ConnectionError> {
        let Self {
            stream,
            peer,
            connection_id,
            coordinator,
            cancel_token,
        } = self;

        let ws = match timeout(
            HANDSHAKE_TIMEOUT,
            accept_async_with_config(stream, Some(websocket_config())),
        )
        .await
        {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => {
                warn!(peer = %peer, error = %e, "WebSocket handshake failed");
                return Err(ConnectionError::Handshake(e.to_string()));
            }
            Err(_) => {
                warn!(peer = %peer, "WebSocket handshake timed out");
                return Err(ConnectionError::HandshakeTimeout);
            }
        };

        let (mut sink, stream) = ws.split();
        let (outbox, inbox) = mpsc::unbounded_channel();

        if let Err(e) = coordinator.connect(connection_id.clone(), outbox).await {
            warn!(
                connection_id = %connection_id,
                peer = %peer,
                error = %e,
                "Connection rejected"
            );
            let _ = sink.close().await;
            return Err(ConnectionError::Rejected(e));
        }

        info!(connection_id = %connection_id, peer = %peer, "Client connected");

        let writer = tokio::spawn(write_outbound(sink, inbox, connection_id.clone()));

        let result = read_inbound(stream, &connection_id, &coordinator, &cancel_token).await;

        // Unregistering drops the outbox sender, which ends the writer.
        coordinator.disconnect(connection_id.clone()).await;

        match timeout(WRITE_TIMEOUT, writer).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(connection_id = %connection_id, error = %e, "Writer task failed"),
            Err(_) => debug!(connection_id = %connection_id, "Writer did not finish in time"),
        }

        info!(connection_id = %connection_id, "Client disconnected");
        result
    }
}

fn websocket_config() -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(MAX_MESSAGE_SIZE);
    config.max_frame_size = Some(MAX_MESSAGE_SIZE);
    config
}

/// Reads frames until the socket closes, the read times out, or shutdown.
async fn read_inbound(
    mut stream: WsStream,
    connection_id: &ConnectionId,
    coordinator: &CoordinatorHandle,
    cancel_token: &CancellationToken,
) -> Result<(), ConnectionError> {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                debug!(connection_id = %connection_id, "Closing connection for shutdown");
                return Ok(());
            }

            result = timeout(READ_TIMEOUT, stream.next()) => {
                let message = match result {
                    Err(_) => return Err(ConnectionError::Timeout),
                    Ok(None) => return Ok(()),
                    Ok(Some(Err(e))) => return Err(ConnectionError::Io(e.to_string())),
                    Ok(Some(Ok(message))) => message,
                };

                match message {
                    Message::Text(text) => {
                        handle_text(&text, connection_id, coordinator).await?;
                    }
                    Message::Binary(data) => {
                        warn!(
                            connection_id = %connection_id,
                            size = data.len(),
                            "Dropping binary frame"
                        );
                    }
                    Message::Close(_) => return Ok(()),
                    // Pings are answered by tungstenite itself
                    Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                }
            }
        }
    }
}

/// Decodes one text frame and hands it to the coordinator.
///
/// Undecodable frames are logged and dropped; only a dead coordinator is an error.
async fn handle_text(
    text: &str,
    connection_id: &ConnectionId,
    coordinator: &CoordinatorHandle,
) -> Result<(), ConnectionError> {
    let event = match decode_inbound(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(connection_id = %connection_id, error = %e, "Dropping frame");
            return Ok(());
        }
    };

    debug!(connection_id = %connection_id, event = event.name(), "Received event");

    coordinator
        .dispatch(connection_id.clone(), event)
        .await
        .map_err(ConnectionError::Coordinator)
}

/// Drains the outbox onto the socket, then closes it.
///
/// Ends when the coordinator drops the outbox sender or a write fails.
async fn write_outbound(
    mut sink: WsSink,
    mut inbox: mpsc::UnboundedReceiver<OutboundEvent>,
    connection_id: ConnectionId,
) {
    while let Some(event) = inbox.recv().await {
        let text = match encode_outbound(&event) {
            Ok(text) => text,
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "Failed to encode event");
                continue;
            }
        };

        match timeout(WRITE_TIMEOUT, sink.send(Message::Text(text))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(connection_id = %connection_id, error = %e, "Failed to write frame");
                break;
            }
            Err(_) => {
                warn!(connection_id = %connection_id, "Write timed out");
                break;
            }
        }
    }

    let _ = timeout(WRITE_TIMEOUT, sink.close()).await;
}

/// Errors that can occur during connection handling.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    #[error("WebSocket handshake timed out")]
    HandshakeTimeout,

    #[error("Connection rejected: {0}")]
    Rejected(CoordinatorError),

    #[error("Coordinator error: {0}")]
    Coordinator(CoordinatorError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Read timeout")]
    Timeout,
}
