//! Room event coordinator using the Actor pattern.
//!
//! The coordinator is the central state manager for every room. It owns
//! the participant registry and the room broadcast groups, receives
//! transport events and client events via a tokio mpsc channel, and
//! emits outbound events straight into per-connection outboxes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ConnectionHandler │────▶│ RoomCoordinator  │────▶│ Outbox (per conn)│
//! └──────────────────┘     └──────────────────┘     └──────────────────┘
//!         │                        │                         │
//!         │  CoordinatorCommand    │  OutboundEvent          │
//!         │  (mpsc channel)        │  (unicast / multicast)  │
//!         ▼                        ▼                         ▼
//!   connect / dispatch /   ParticipantRegistry +      writer task sends
//!   disconnect             BroadcastGroups            WebSocket frames
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::mpsc;

mod actor;
mod commands;
mod groups;
mod handle;

pub use actor::{RoomCoordinator, MAX_CONNECTIONS};
pub use commands::{CoordinatorCommand, CoordinatorError};
pub use groups::{BroadcastGroups, Outbox};
pub use handle::CoordinatorHandle;

/// Command channel buffer size
const COMMAND_BUFFER: usize = 256;

/// Spawn the coordinator actor and return a handle for interaction.
///
/// The registry starts empty. The actor stops once every handle clone has
/// been dropped.
///
/// # Example
///
/// ```no_run
/// use pokerd::coordinator::spawn_coordinator;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_coordinator();
///     let participants = handle.all_participants().await;
///     assert!(participants.is_empty());
/// }
/// ```
pub fn spawn_coordinator() -> CoordinatorHandle {
    spawn_coordinator_with_limit(MAX_CONNECTIONS)
}

/// Spawn the coordinator actor with a custom connection limit.
pub fn spawn_coordinator_with_limit(max_connections: usize) -> CoordinatorHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let actor = RoomCoordinator::new(cmd_rx).with_max_connections(max_connections);
    tokio::spawn(actor.run());

    CoordinatorHandle::new(cmd_tx)
}
