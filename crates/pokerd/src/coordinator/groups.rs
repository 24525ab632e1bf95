//! Connection outboxes and room broadcast groups.
//!
//! Every live connection registers an [`Outbox`]: the sending half of an
//! unbounded channel drained by that connection's writer task. Sending
//! never awaits, so a coordinator handler runs to completion without
//! yielding to socket I/O.
//!
//! A broadcast group binds connections to a room code for multicast.
//! Group membership is transport state, separate from the participant
//! registry: a connection leaves every group when it unregisters.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use poker_core::{ConnectionId, RoomCode};
use poker_protocol::OutboundEvent;

/// Sending half of a connection's outbound event queue.
pub type Outbox = mpsc::UnboundedSender<OutboundEvent>;

/// Live connections and the room groups they belong to.
#[derive(Debug, Default)]
pub struct BroadcastGroups {
    /// Outbox per live connection
    outboxes: HashMap<ConnectionId, Outbox>,

    /// Members of each room group, in join order
    groups: HashMap<RoomCode, Vec<ConnectionId>>,
}

impl BroadcastGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live connection.
    ///
    /// Returns `false` (and keeps the existing outbox) if the id is taken.
    pub fn register(&mut self, connection_id: ConnectionId, outbox: Outbox) -> bool {
        if self.outboxes.contains_key(&connection_id) {
            return false;
        }
        self.outboxes.insert(connection_id, outbox);
        true
    }

    /// Drops the connection's outbox and removes it from every group.
    ///
    /// Dropping the outbox lets the writer task drain and finish.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> bool {
        self.groups.retain(|_, members| {
            members.retain(|id| id != connection_id);
            !members.is_empty()
        });
        self.outboxes.remove(connection_id).is_some()
    }

    /// Adds a live connection to a room group. Joining twice is a no-op.
    pub fn join(&mut self, connection_id: &ConnectionId, room_code: &RoomCode) {
        if !self.outboxes.contains_key(connection_id) {
            return;
        }
        let members = self.groups.entry(room_code.clone()).or_default();
        if !members.contains(connection_id) {
            members.push(connection_id.clone());
        }
    }

    /// Removes a connection from a room group.
    pub fn leave(&mut self, connection_id: &ConnectionId, room_code: &RoomCode) {
        if let Some(members) = self.groups.get_mut(room_code) {
            members.retain(|id| id != connection_id);
            if members.is_empty() {
                self.groups.remove(room_code);
            }
        }
    }

    /// Sends `event` to exactly one connection.
    ///
    /// Returns `false` if the connection is unknown or its writer is gone.
    pub fn unicast(&self, connection_id: &ConnectionId, event: OutboundEvent) -> bool {
        let Some(outbox) = self.outboxes.get(connection_id) else {
            return false;
        };
        deliver(connection_id, outbox, event)
    }

    /// Sends `event` to every connection in the room group.
    ///
    /// Returns the number of connections the event was queued for.
    pub fn multicast(&self, room_code: &RoomCode, event: &OutboundEvent) -> usize {
        let Some(members) = self.groups.get(room_code) else {
            return 0;
        };

        members
            .iter()
            .filter_map(|id| self.outboxes.get(id).map(|outbox| (id, outbox)))
            .filter(|(id, outbox)| deliver(id, outbox, event.clone()))
            .count()
    }

    /// Returns true if the connection is registered.
    #[must_use]
    pub fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.outboxes.contains_key(connection_id)
    }

    /// Returns true if the connection is in the room group.
    #[must_use]
    pub fn is_member(&self, connection_id: &ConnectionId, room_code: &RoomCode) -> bool {
        self.groups
            .get(room_code)
            .is_some_and(|members| members.contains(connection_id))
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.outboxes.len()
    }

    /// Number of connections in the room group.
    pub fn group_size(&self, room_code: &RoomCode) -> usize {
        self.groups.get(room_code).map_or(0, Vec::len)
    }
}

fn deliver(connection_id: &ConnectionId, outbox: &Outbox, event: OutboundEvent) -> bool {
    let name = event.name();
    match outbox.send(event) {
        Ok(()) => true,
        Err(_) => {
            // Writer already gone; the disconnect is on its way.
            debug!(connection_id = %connection_id, event = name, "Dropped event for closed connection");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(groups: &mut BroadcastGroups, id: &str) -> mpsc::UnboundedReceiver<OutboundEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        assert!(groups.register(ConnectionId::new(id), tx));
        rx
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let mut groups = BroadcastGroups::new();
        let _rx = connection(&mut groups, "a");

        let (tx, _rx2) = mpsc::unbounded_channel();
        assert!(!groups.register(ConnectionId::new("a"), tx));
        assert_eq!(groups.connection_count(), 1);
    }

    #[test]
    fn test_multicast_reaches_only_group_members() {
        let mut groups = BroadcastGroups::new();
        let mut a = connection(&mut groups, "a");
        let mut b = connection(&mut groups, "b");
        let mut c = connection(&mut groups, "c");
        let room = RoomCode::new("123");

        groups.join(&ConnectionId::new("a"), &room);
        groups.join(&ConnectionId::new("b"), &room);
        groups.join(&ConnectionId::new("c"), &RoomCode::new("999"));

        let sent = groups.multicast(&room, &OutboundEvent::ChangeVisibilityVotes(true));
        assert_eq!(sent, 2);
        assert_eq!(a.try_recv().unwrap(), OutboundEvent::ChangeVisibilityVotes(true));
        assert_eq!(b.try_recv().unwrap(), OutboundEvent::ChangeVisibilityVotes(true));
        assert!(c.try_recv().is_err());
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut groups = BroadcastGroups::new();
        let mut a = connection(&mut groups, "a");
        let room = RoomCode::new("123");

        groups.join(&ConnectionId::new("a"), &room);
        groups.join(&ConnectionId::new("a"), &room);
        assert_eq!(groups.group_size(&room), 1);

        groups.multicast(&room, &OutboundEvent::ChangeVisibilityVotes(false));
        assert!(a.try_recv().is_ok());
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn test_join_requires_registration() {
        let mut groups = BroadcastGroups::new();
        let room = RoomCode::new("123");
        groups.join(&ConnectionId::new("ghost"), &room);
        assert_eq!(groups.group_size(&room), 0);
    }

    #[test]
    fn test_leave_and_unregister() {
        let mut groups = BroadcastGroups::new();
        let _a = connection(&mut groups, "a");
        let room1 = RoomCode::new("111");
        let room2 = RoomCode::new("222");
        let a = ConnectionId::new("a");

        groups.join(&a, &room1);
        groups.join(&a, &room2);
        groups.leave(&a, &room1);
        assert!(!groups.is_member(&a, &room1));
        assert!(groups.is_member(&a, &room2));

        assert!(groups.unregister(&a));
        assert!(!groups.is_member(&a, &room2));
        assert!(!groups.is_registered(&a));
        assert_eq!(groups.connection_count(), 0);
        assert!(!groups.unregister(&a));
    }

    #[test]
    fn test_unregister_closes_outbox() {
        let mut groups = BroadcastGroups::new();
        let mut a = connection(&mut groups, "a");

        groups.unregister(&ConnectionId::new("a"));
        assert!(matches!(
            a.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_unicast_to_closed_writer() {
        let mut groups = BroadcastGroups::new();
        let a = connection(&mut groups, "a");
        drop(a);

        assert!(!groups.unicast(&ConnectionId::new("a"), OutboundEvent::ChangeVisibilityVotes(true)));
        assert!(!groups.unicast(&ConnectionId::new("b"), OutboundEvent::ChangeVisibilityVotes(true)));
    }
}
