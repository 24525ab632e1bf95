//! Coordinator actor commands and errors.
//!
//! This module defines the message types for communicating with the `RoomCoordinator`:
//! - `CoordinatorCommand`: Commands sent to the actor
//! - `CoordinatorError`: Errors that can occur during coordinator operations
//!
//! All types are designed for async message passing and follow the panic-free policy.

use poker_core::{ConnectionId, Participant, RoomCode};
use poker_protocol::InboundEvent;
use thiserror::Error;
use tokio::sync::oneshot;

use super::groups::Outbox;

// ============================================================================
// Coordinator Commands
// ============================================================================

/// Commands sent to the coordinator actor.
///
/// Queries and `Connect` carry a oneshot channel for the response.
/// `Disconnect` and `Dispatch` are fire-and-forget: their effects reach
/// clients as outbound events, never as a response.
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// A client channel was opened (the `connection` event).
    ///
    /// # Errors
    /// - `CoordinatorError::ConnectionAlreadyExists` if the id is live
    /// - `CoordinatorError::TooManyConnections` if at maximum capacity
    Connect {
        /// Transport-assigned id of the new connection
        connection_id: ConnectionId,
        /// Queue drained by the connection's writer task
        outbox: Outbox,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), CoordinatorError>>,
    },

    /// A client channel was closed (the `disconnect` event).
    Disconnect {
        /// Id of the closed connection
        connection_id: ConnectionId,
    },

    /// A named event arrived on a client channel.
    Dispatch {
        /// Originating connection
        connection_id: ConnectionId,
        /// The decoded event
        event: InboundEvent,
    },

    /// Get the participant owned by a connection.
    GetParticipant {
        connection_id: ConnectionId,
        respond_to: oneshot::Sender<Option<Participant>>,
    },

    /// Get every member of a room, in join order.
    GetRoomMembers {
        room_code: RoomCode,
        respond_to: oneshot::Sender<Vec<Participant>>,
    },

    /// Get every participant across all rooms.
    GetAllParticipants {
        respond_to: oneshot::Sender<Vec<Participant>>,
    },

    /// Get the number of live connections.
    GetConnectionCount {
        respond_to: oneshot::Sender<usize>,
    },
}

// ============================================================================
// Coordinator Errors
// ============================================================================

/// Errors that can occur during coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// The coordinator has reached its maximum connection capacity.
    #[error("too many connections (max: {max})")]
    TooManyConnections {
        /// Maximum number of connections allowed
        max: usize,
    },

    /// A connection with this id is already registered.
    #[error("connection already exists: {0}")]
    ConnectionAlreadyExists(ConnectionId),

    /// The command or response channel was closed.
    ///
    /// This typically indicates the actor was shut down.
    #[error("coordinator channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_error_display() {
        let err = CoordinatorError::TooManyConnections { max: 10 };
        assert_eq!(err.to_string(), "too many connections (max: 10)");

        let err = CoordinatorError::ConnectionAlreadyExists(ConnectionId::new("conn-4"));
        assert_eq!(err.to_string(), "connection already exists: conn-4");

        let err = CoordinatorError::ChannelClosed;
        assert_eq!(err.to_string(), "coordinator channel closed");
    }

    #[tokio::test]
    async fn test_command_oneshot_pattern() {
        let (tx, rx) = oneshot::channel::<Result<(), CoordinatorError>>();

        tokio::spawn(async move {
            tx.send(Ok(())).ok();
        });

        let result = rx.await;
        assert!(result.is_ok());
        assert!(result.unwrap().is_ok());
    }
}
