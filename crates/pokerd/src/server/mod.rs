//! WebSocket server for the room server.
//!
//! The server:
//! - Listens on a TCP socket for WebSocket clients
//! - Assigns each accepted socket a `conn-<n>` connection id
//! - Spawns a ConnectionHandler for each client
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   PokerServer   │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌───────────────────┐
//! │ConnectionHandler│────▶│ CoordinatorHandle │
//! │   (per client)  │     │                   │
//! └─────────────────┘     └───────────────────┘
//!         ▲                         │
//!         │ outbox                  │ unicast / multicast
//!         └─────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Accept errors are logged and allow continued operation

mod connection;

pub use connection::{
    ConnectionError, ConnectionHandler, HANDSHAKE_TIMEOUT, MAX_MESSAGE_SIZE, READ_TIMEOUT,
};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use poker_core::ConnectionId;

use crate::config::ServerConfig;
use crate::coordinator::CoordinatorHandle;

/// Time connection tasks get to close their sockets on shutdown
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// WebSocket server accepting planning-poker clients.
pub struct PokerServer {
    /// Bound listener
    listener: TcpListener,

    /// Address actually bound (resolves port 0)
    local_addr: SocketAddr,

    /// Handle to the room coordinator
    coordinator: CoordinatorHandle,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter for generating connection ids
    connection_counter: AtomicU64,
}

impl PokerServer {
    /// Binds the listener described by `config`.
    ///
    /// Binding happens here rather than in `run` so callers (and tests using
    /// port 0) can learn the bound address before serving.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound.
    pub async fn bind(
        config: &ServerConfig,
        coordinator: CoordinatorHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: config.bind_addr,
                error: e.to_string(),
            })?;

        let local_addr = listener.local_addr().map_err(|e| ServerError::Bind {
            addr: config.bind_addr,
            error: e.to_string(),
        })?;

        Ok(Self {
            listener,
            local_addr,
            coordinator,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the server.
    ///
    /// Accepts connections until the cancellation token is triggered.
    /// Connection tasks observe the same token; `run` returns once they have
    /// closed their sockets and reported the disconnect, or after
    /// [`SHUTDOWN_GRACE_PERIOD`].
    pub async fn run(self) -> Result<(), ServerError> {
        info!(addr = %self.local_addr, "Poker server listening");

        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let n = self.connection_counter.fetch_add(1, Ordering::Relaxed) + 1;
                            self.handle_connection(
                                &mut connections,
                                stream,
                                peer,
                                ConnectionId::from_sequence(n),
                            );
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }

                // Reap finished connection tasks
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        self.drain_connections(&mut connections).await;

        info!(
            accepted = self.connection_counter.load(Ordering::Relaxed),
            "Server stopped"
        );
        Ok(())
    }

    /// Waits for open connections to finish closing.
    async fn drain_connections(&self, connections: &mut JoinSet<()>) {
        if connections.is_empty() {
            return;
        }

        debug!(open = connections.len(), "Waiting for connections to close");

        let drained = timeout(SHUTDOWN_GRACE_PERIOD, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                remaining = connections.len(),
                "Connections still open after grace period, aborting"
            );
            connections.abort_all();
        }
    }

    /// Handles a new client socket by spawning a handler task.
    fn handle_connection(
        &self,
        connections: &mut JoinSet<()>,
        stream: TcpStream,
        peer: SocketAddr,
        connection_id: ConnectionId,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let handler = ConnectionHandler::new(
            stream,
            peer,
            connection_id.clone(),
            self.coordinator.clone(),
            self.cancel_token.child_token(),
        );

        connections.spawn(async move {
            if let Err(e) = handler.run().await {
                debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "Connection ended with error"
                );
            }
        });
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: SocketAddr, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::spawn_coordinator;

    #[test]
    fn test_server_error_display() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:3001".parse().unwrap(),
            error: "address in use".to_string(),
        };
        assert!(err.to_string().contains("127.0.0.1:3001"));
        assert!(err.to_string().contains("address in use"));
    }

    #[tokio::test]
    async fn test_bind_resolves_ephemeral_port() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let server = PokerServer::bind(&config, spawn_coordinator(), CancellationToken::new())
            .await
            .unwrap();

        assert_ne!(server.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_error() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let first = PokerServer::bind(&config, spawn_coordinator(), CancellationToken::new())
            .await
            .unwrap();

        let taken = ServerConfig::new(first.local_addr());
        let result = PokerServer::bind(&taken, spawn_coordinator(), CancellationToken::new()).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let cancel = CancellationToken::new();
        let server = PokerServer::bind(&config, spawn_coordinator(), cancel.clone())
            .await
            .unwrap();

        let task = tokio::spawn(server.run());
        cancel.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
