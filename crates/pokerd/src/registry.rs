//! Participant registry.
//!
//! Plain in-memory collection of [`Participant`] records keyed by
//! connection id. It holds no channels and does no I/O; the coordinator
//! actor owns the single instance and is the only thing that mutates it.
//!
//! Records are kept in insertion order so that room member lists are
//! deterministic. Lookups are a linear scan, which is fine for the low
//! thousands of live connections the server is sized for.

use poker_core::{ConnectionId, Participant, RoomCode};

/// Ordered collection of participant records.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
}

impl ParticipantRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record owned by `connection_id`.
    pub fn find(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| &p.connection_id == connection_id)
    }

    /// Appends a record.
    ///
    /// Callers are responsible for removing any previous record of the same
    /// connection first; see [`ParticipantRegistry::remove`].
    pub fn insert(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    /// Removes and returns the record owned by `connection_id`, if any.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.connection_id == connection_id)?;
        Some(self.participants.remove(index))
    }

    /// Applies `mutate` to the record owned by `connection_id`.
    ///
    /// Returns a copy of the updated record, or `None` if there is none.
    pub fn update<F>(&mut self, connection_id: &ConnectionId, mutate: F) -> Option<Participant>
    where
        F: FnOnce(&mut Participant),
    {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| &p.connection_id == connection_id)?;
        mutate(participant);
        Some(participant.clone())
    }

    /// Applies `mutate` to every record, across all rooms.
    ///
    /// Returns the number of records touched.
    pub fn update_all<F>(&mut self, mut mutate: F) -> usize
    where
        F: FnMut(&mut Participant),
    {
        self.participants.iter_mut().for_each(&mut mutate);
        self.participants.len()
    }

    /// Returns copies of every member of `room_code`, in insertion order.
    pub fn members_of(&self, room_code: &RoomCode) -> Vec<Participant> {
        self.participants
            .iter()
            .filter(|p| p.is_in_room(room_code))
            .cloned()
            .collect()
    }

    /// Iterates over every record in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poker_core::NO_VOTE;

    fn participant(id: &str, room: &str) -> Participant {
        Participant::new(ConnectionId::new(id), id.to_uppercase(), false, RoomCode::new(room))
    }

    fn registry_with(entries: &[(&str, &str)]) -> ParticipantRegistry {
        let mut registry = ParticipantRegistry::new();
        for (id, room) in entries {
            registry.insert(participant(id, room));
        }
        registry
    }

    #[test]
    fn test_find() {
        let registry = registry_with(&[("a", "111"), ("b", "222")]);

        let found = registry.find(&ConnectionId::new("b")).unwrap();
        assert_eq!(found.name, "B");
        assert!(registry.find(&ConnectionId::new("zzz")).is_none());
    }

    #[test]
    fn test_remove() {
        let mut registry = registry_with(&[("a", "111"), ("b", "111")]);

        let removed = registry.remove(&ConnectionId::new("a")).unwrap();
        assert_eq!(removed.connection_id.as_str(), "a");
        assert_eq!(registry.len(), 1);

        // Removing again is a no-op
        assert!(registry.remove(&ConnectionId::new("a")).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_returns_updated_copy() {
        let mut registry = registry_with(&[("a", "111")]);

        let updated = registry
            .update(&ConnectionId::new("a"), |p| p.cast_vote(5))
            .unwrap();
        assert_eq!(updated.vote, 5);
        assert_eq!(registry.find(&ConnectionId::new("a")).unwrap().vote, 5);
    }

    #[test]
    fn test_update_missing_is_none() {
        let mut registry = registry_with(&[("a", "111")]);
        assert!(registry
            .update(&ConnectionId::new("b"), |p| p.cast_vote(5))
            .is_none());
        assert_eq!(registry.find(&ConnectionId::new("a")).unwrap().vote, 0);
    }

    #[test]
    fn test_update_all_crosses_rooms() {
        let mut registry = registry_with(&[("a", "111"), ("b", "222")]);
        registry.update(&ConnectionId::new("a"), |p| p.cast_vote(3));
        registry.update(&ConnectionId::new("b"), |p| p.cast_vote(8));

        let touched = registry.update_all(Participant::reset_vote);
        assert_eq!(touched, 2);
        assert!(registry.iter().all(|p| p.vote == NO_VOTE));
    }

    #[test]
    fn test_members_of_keeps_insertion_order() {
        let registry = registry_with(&[("c", "111"), ("x", "999"), ("a", "111"), ("b", "111")]);

        let ids: Vec<_> = registry
            .members_of(&RoomCode::new("111"))
            .into_iter()
            .map(|p| p.connection_id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert!(registry.members_of(&RoomCode::new("000")).is_empty());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ParticipantRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.iter().count(), 0);
    }
}
