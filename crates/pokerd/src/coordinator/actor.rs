//! Coordinator actor - owns the participant registry and room groups.
//!
//! The RoomCoordinator is the single owner of room state in the server.
//! It receives commands via an mpsc channel and processes them one at a
//! time, so each event handler's reads and writes are atomic with
//! respect to every other handler.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - A missing participant or room is a silent no-op, never an error
//! - Outbox send failures are logged but don't panic

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use poker_core::{ConnectionId, Participant, RoomCode, Vote};
use poker_protocol::{CreateRoomRequest, InboundEvent, JoinRoomRequest, OutboundEvent};

use super::commands::{CoordinatorCommand, CoordinatorError};
use super::groups::{BroadcastGroups, Outbox};
use crate::registry::ParticipantRegistry;

/// Maximum number of live connections the coordinator accepts.
pub const MAX_CONNECTIONS: usize = 10_000;

// ============================================================================
// Room Coordinator
// ============================================================================

/// The coordinator actor - owns all room state.
///
/// # Ownership
///
/// The actor owns:
/// - `registry`: participant records, in join order
/// - `groups`: connection outboxes and room broadcast groups
/// - `rng`: source for room code generation
pub struct RoomCoordinator {
    /// Command receiver
    receiver: mpsc::Receiver<CoordinatorCommand>,

    /// Participant records keyed by connection id
    registry: ParticipantRegistry,

    /// Outboxes and room broadcast groups
    groups: BroadcastGroups,

    /// Room code generator
    rng: StdRng,

    /// Live connections accepted before `connect` is refused
    max_connections: usize,
}

impl RoomCoordinator {
    /// Creates a new coordinator with an empty registry.
    pub fn new(receiver: mpsc::Receiver<CoordinatorCommand>) -> Self {
        Self::with_rng(receiver, StdRng::from_entropy())
    }

    /// Creates a coordinator with a specific room code generator.
    pub fn with_rng(receiver: mpsc::Receiver<CoordinatorCommand>, rng: StdRng) -> Self {
        Self {
            receiver,
            registry: ParticipantRegistry::new(),
            groups: BroadcastGroups::new(),
            rng,
            max_connections: MAX_CONNECTIONS,
        }
    }

    /// Overrides the connection limit (default [`MAX_CONNECTIONS`]).
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    pub async fn run(mut self) {
        info!("Room coordinator starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            participants = self.registry.len(),
            connections = self.groups.connection_count(),
            "Room coordinator stopped"
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: CoordinatorCommand) {
        match cmd {
            CoordinatorCommand::Connect {
                connection_id,
                outbox,
                respond_to,
            } => {
                let result = self.handle_connect(connection_id, outbox);
                // Ignore send error - the connection task may have gone
                let _ = respond_to.send(result);
            }
            CoordinatorCommand::Disconnect { connection_id } => {
                self.handle_disconnect(&connection_id);
            }
            CoordinatorCommand::Dispatch {
                connection_id,
                event,
            } => {
                self.handle_event(&connection_id, event);
            }
            CoordinatorCommand::GetParticipant {
                connection_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.registry.find(&connection_id).cloned());
            }
            CoordinatorCommand::GetRoomMembers {
                room_code,
                respond_to,
            } => {
                let _ = respond_to.send(self.registry.members_of(&room_code));
            }
            CoordinatorCommand::GetAllParticipants { respond_to } => {
                let _ = respond_to.send(self.registry.iter().cloned().collect());
            }
            CoordinatorCommand::GetConnectionCount { respond_to } => {
                let _ = respond_to.send(self.groups.connection_count());
            }
        }
    }

    /// Routes an inbound client event to its handler.
    fn handle_event(&mut self, connection_id: &ConnectionId, event: InboundEvent) {
        if !self.groups.is_registered(connection_id) {
            debug!(
                connection_id = %connection_id,
                event = event.name(),
                "Event from unknown connection, ignoring"
            );
            return;
        }

        debug!(connection_id = %connection_id, event = event.name(), "Dispatching event");

        match event {
            InboundEvent::CreateRoom(request) => self.handle_create_room(connection_id, request),
            InboundEvent::JoinRoom(request) => self.handle_join_room(connection_id, request),
            InboundEvent::ToVote(vote) => self.handle_vote(connection_id, vote),
            InboundEvent::TryChangeVote => self.handle_try_change_vote(connection_id),
            InboundEvent::ShowVotes(visible) => self.handle_show_votes(connection_id, visible),
            InboundEvent::ResetVotes => self.handle_reset_votes(connection_id),
        }
    }

    // ========================================================================
    // Connection Lifecycle
    // ========================================================================

    fn handle_connect(
        &mut self,
        connection_id: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), CoordinatorError> {
        if self.groups.connection_count() >= self.max_connections {
            warn!(
                connection_id = %connection_id,
                max = self.max_connections,
                "Connection limit reached, rejecting connection"
            );
            return Err(CoordinatorError::TooManyConnections {
                max: self.max_connections,
            });
        }

        if !self.groups.register(connection_id.clone(), outbox) {
            warn!(connection_id = %connection_id, "Connection id already registered");
            return Err(CoordinatorError::ConnectionAlreadyExists(connection_id));
        }

        debug!(
            connection_id = %connection_id,
            connections = self.groups.connection_count(),
            "Connection registered"
        );
        Ok(())
    }

    /// Drops the connection's channel and, if it was in a room, removes its
    /// participant and tells the rest of the room.
    fn handle_disconnect(&mut self, connection_id: &ConnectionId) {
        self.groups.unregister(connection_id);

        let Some(room_code) = self.room_of(connection_id) else {
            debug!(connection_id = %connection_id, "Disconnected without a room");
            return;
        };

        self.registry.remove(connection_id);

        info!(
            connection_id = %connection_id,
            room_code = %room_code,
            remaining = self.groups.group_size(&room_code),
            "Participant left room"
        );

        self.broadcast_members(&room_code);
    }

    // ========================================================================
    // Room Membership
    // ========================================================================

    fn handle_create_room(&mut self, connection_id: &ConnectionId, request: CreateRoomRequest) {
        let room_code = RoomCode::generate(&mut self.rng);

        info!(
            connection_id = %connection_id,
            room_code = %room_code,
            members_with_code = self.groups.group_size(&room_code),
            "Room created"
        );

        self.admit(connection_id, request.name, request.is_admin, room_code);
    }

    fn handle_join_room(&mut self, connection_id: &ConnectionId, request: JoinRoomRequest) {
        if !request.room_code.is_generated_format() {
            debug!(
                connection_id = %connection_id,
                room_code = %request.room_code,
                "Joining room with a non-generated code"
            );
        }

        info!(
            connection_id = %connection_id,
            room_code = %request.room_code,
            "Participant joining room"
        );

        self.admit(
            connection_id,
            request.name,
            request.is_admin,
            request.room_code,
        );
    }

    /// Places a fresh participant for `connection_id` in `room_code`.
    ///
    /// A connection owns at most one record: an earlier record is replaced,
    /// and if it was in another room that room is told the member left.
    fn admit(
        &mut self,
        connection_id: &ConnectionId,
        name: String,
        is_admin: bool,
        room_code: RoomCode,
    ) {
        if let Some(previous) = self.registry.remove(connection_id) {
            if let Some(previous_room) = previous.room_code.filter(|r| r != &room_code) {
                debug!(
                    connection_id = %connection_id,
                    from = %previous_room,
                    to = %room_code,
                    "Connection switching rooms"
                );
                self.groups.leave(connection_id, &previous_room);
                self.broadcast_members(&previous_room);
            }
        }

        let participant = Participant::new(connection_id.clone(), name, is_admin, room_code.clone());
        self.registry.insert(participant.clone());
        self.groups.join(connection_id, &room_code);

        self.groups
            .unicast(connection_id, OutboundEvent::SentRoom(room_code.clone()));
        self.groups.unicast(connection_id, OutboundEvent::Me(participant));
        self.broadcast_members(&room_code);
    }

    // ========================================================================
    // Voting
    // ========================================================================

    fn handle_vote(&mut self, connection_id: &ConnectionId, vote: Vote) {
        let Some(room_code) = self.room_of(connection_id) else {
            debug!(connection_id = %connection_id, "Vote outside a room, ignoring");
            return;
        };

        let Some(updated) = self.registry.update(connection_id, |p| p.cast_vote(vote)) else {
            return;
        };

        debug!(connection_id = %connection_id, room_code = %room_code, vote, "Vote cast");

        self.groups
            .multicast(&room_code, &OutboundEvent::WhoVoted(updated));
        self.broadcast_members(&room_code);
    }

    fn handle_try_change_vote(&mut self, connection_id: &ConnectionId) {
        let Some((participant, room_code)) = self.participant_in_room(connection_id) else {
            debug!(connection_id = %connection_id, "Change attempt outside a room, ignoring");
            return;
        };

        self.groups.multicast(
            &room_code,
            &OutboundEvent::WhoTryChangeVoted(participant),
        );
    }

    /// Toggles visibility: the room receives the negation of `visible`.
    fn handle_show_votes(&mut self, connection_id: &ConnectionId, visible: bool) {
        let Some(room_code) = self.room_of(connection_id) else {
            debug!(connection_id = %connection_id, "Show votes outside a room, ignoring");
            return;
        };

        debug!(
            connection_id = %connection_id,
            room_code = %room_code,
            visible = !visible,
            "Vote visibility changed"
        );

        self.groups.multicast(
            &room_code,
            &OutboundEvent::ChangeVisibilityVotes(!visible),
        );
    }

    /// Resets every participant's vote in every room.
    ///
    /// Only the caller's room is notified; other rooms see their reset
    /// votes with their next member list update.
    fn handle_reset_votes(&mut self, connection_id: &ConnectionId) {
        let room_code = self.room_of(connection_id);
        let reset = self.registry.update_all(Participant::reset_vote);

        info!(
            connection_id = %connection_id,
            room_code = ?room_code.as_ref().map(RoomCode::as_str),
            participants = reset,
            "Votes reset across all rooms"
        );

        if let Some(room_code) = room_code {
            self.broadcast_members(&room_code);
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Returns the room of the connection's participant, if it has one.
    fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomCode> {
        self.registry
            .find(connection_id)
            .and_then(|p| p.room().cloned())
    }

    fn participant_in_room(&self, connection_id: &ConnectionId) -> Option<(Participant, RoomCode)> {
        let participant = self.registry.find(connection_id)?;
        let room_code = participant.room()?.clone();
        Some((participant.clone(), room_code))
    }

    /// Sends the room's full member list to the room.
    fn broadcast_members(&self, room_code: &RoomCode) {
        let members = self.registry.members_of(room_code);
        let delivered = self
            .groups
            .multicast(room_code, &OutboundEvent::AllUsers(members));
        debug!(room_code = %room_code, delivered, "Member list broadcast");
    }

    /// Returns the number of participant records (for testing).
    #[cfg(test)]
    pub fn participant_count(&self) -> usize {
        self.registry.len()
    }
}
