//! Client interface for interacting with the RoomCoordinator.
//!
//! The `CoordinatorHandle` provides a cheap-to-clone interface that
//! connection tasks use to report transport events and to query room state.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `CoordinatorError::ChannelClosed`

use tokio::sync::{mpsc, oneshot};

use poker_core::{ConnectionId, Participant, RoomCode};
use poker_protocol::InboundEvent;

use super::commands::{CoordinatorCommand, CoordinatorError};
use super::groups::Outbox;

// ============================================================================
// Coordinator Handle
// ============================================================================

/// Handle for interacting with the coordinator actor.
///
/// # Usage
///
/// ```ignore
/// let (outbox, mut inbox) = tokio::sync::mpsc::unbounded_channel();
/// handle.connect(connection_id.clone(), outbox).await?;
///
/// handle.dispatch(connection_id.clone(), event).await?;
/// while let Some(outbound) = inbox.recv().await {
///     // write to the socket
/// }
///
/// handle.disconnect(connection_id).await;
/// ```
#[derive(Clone)]
pub struct CoordinatorHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<CoordinatorCommand>,
}

impl CoordinatorHandle {
    /// Create a new coordinator handle.
    pub fn new(sender: mpsc::Sender<CoordinatorCommand>) -> Self {
        Self { sender }
    }

    /// Register a newly opened connection and its outbox.
    ///
    /// # Errors
    ///
    /// - `CoordinatorError::ConnectionAlreadyExists` if the id is already live
    /// - `CoordinatorError::TooManyConnections` if at maximum capacity
    /// - `CoordinatorError::ChannelClosed` if the actor has shut down
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), CoordinatorError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(CoordinatorCommand::Connect {
                connection_id,
                outbox,
                respond_to: tx,
            })
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)?;

        rx.await.map_err(|_| CoordinatorError::ChannelClosed)?
    }

    /// Report that a connection closed.
    ///
    /// Fire-and-forget: ignores a closed channel (actor shutting down).
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let _ = self
            .sender
            .send(CoordinatorCommand::Disconnect { connection_id })
            .await;
    }

    /// Hand an inbound client event to the coordinator.
    ///
    /// Events from one caller are processed in the order they are sent.
    ///
    /// # Errors
    ///
    /// - `CoordinatorError::ChannelClosed` if the actor has shut down
    pub async fn dispatch(
        &self,
        connection_id: ConnectionId,
        event: InboundEvent,
    ) -> Result<(), CoordinatorError> {
        self.sender
            .send(CoordinatorCommand::Dispatch {
                connection_id,
                event,
            })
            .await
            .map_err(|_| CoordinatorError::ChannelClosed)
    }

    /// Get the participant owned by a connection.
    ///
    /// Returns `None` if there is none or if communication with the actor fails.
    pub async fn get_participant(&self, connection_id: ConnectionId) -> Option<Participant> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(CoordinatorCommand::GetParticipant {
                connection_id,
                respond_to: tx,
            })
            .await
            .ok()?;

        rx.await.ok()?
    }

    /// Get every member of a room, in join order.
    ///
    /// Returns an empty vector if the room is empty or the actor is gone.
    pub async fn room_members(&self, room_code: RoomCode) -> Vec<Participant> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(CoordinatorCommand::GetRoomMembers {
                room_code,
                respond_to: tx,
            })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Get every participant across all rooms.
    pub async fn all_participants(&self) -> Vec<Participant> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(CoordinatorCommand::GetAllParticipants { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Get the number of live connections (0 if the actor is gone).
    pub async fn connection_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(CoordinatorCommand::GetConnectionCount { respond_to: tx })
            .await
            .is_err()
        {
            return 0;
        }

        rx.await.unwrap_or_default()
    }
}
