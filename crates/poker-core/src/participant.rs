//! Participant entity and its identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::room::RoomCode;

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Unique identifier of a client connection.
///
/// Assigned by the transport when the socket is accepted and stable for
/// the life of the connection. The room server never reuses an id
/// within one process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

/// Prefix used for transport-assigned connection ids.
pub const CONNECTION_ID_PREFIX: &str = "conn-";

impl ConnectionId {
    /// Creates a ConnectionId from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates the id for the n-th accepted connection.
    pub fn from_sequence(n: u64) -> Self {
        Self(format!("{CONNECTION_ID_PREFIX}{n}"))
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// Votes
// ============================================================================

/// An estimate cast by a participant. Any integer is accepted.
pub type Vote = i64;

/// Vote value meaning "no vote cast" (also the value after a reset).
pub const NO_VOTE: Vote = 0;

// ============================================================================
// Participant
// ============================================================================

/// One connected client's state inside a room.
///
/// Serialized with the camelCase keys browser clients expect:
/// `socketId`, `name`, `isAdmin`, `roomCode`, `vote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Connection that owns this record
    #[serde(rename = "socketId")]
    pub connection_id: ConnectionId,

    /// Display name, as supplied by the client
    pub name: String,

    /// Admin flag, recorded but not enforced
    pub is_admin: bool,

    /// Room the participant belongs to
    pub room_code: Option<RoomCode>,

    /// Current vote, [`NO_VOTE`] if none
    pub vote: Vote,
}

impl Participant {
    /// Creates a participant in `room_code` with no vote cast.
    pub fn new(
        connection_id: ConnectionId,
        name: impl Into<String>,
        is_admin: bool,
        room_code: RoomCode,
    ) -> Self {
        Self {
            connection_id,
            name: name.into(),
            is_admin,
            room_code: Some(room_code),
            vote: NO_VOTE,
        }
    }

    /// Returns the room this participant belongs to, if any.
    pub fn room(&self) -> Option<&RoomCode> {
        self.room_code.as_ref()
    }

    /// Returns true if the participant is a member of `room_code`.
    #[must_use]
    pub fn is_in_room(&self, room_code: &RoomCode) -> bool {
        self.room_code.as_ref() == Some(room_code)
    }

    pub fn cast_vote(&mut self, vote: Vote) {
        self.vote = vote;
    }

    pub fn reset_vote(&mut self) {
        self.vote = NO_VOTE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Participant {
        Participant::new(ConnectionId::new("conn-1"), "Alice", true, RoomCode::new("123"))
    }

    #[test]
    fn test_new_participant_has_no_vote() {
        let p = alice();
        assert_eq!(p.vote, NO_VOTE);
        assert_eq!(p.room(), Some(&RoomCode::new("123")));
    }

    #[test]
    fn test_cast_and_reset_vote() {
        let mut p = alice();
        p.cast_vote(8);
        assert_eq!(p.vote, 8);

        p.reset_vote();
        assert_eq!(p.vote, NO_VOTE);
    }

    #[test]
    fn test_negative_votes_are_kept() {
        let mut p = alice();
        p.cast_vote(-3);
        assert_eq!(p.vote, -3);
    }

    #[test]
    fn test_is_in_room() {
        let mut p = alice();
        assert!(p.is_in_room(&RoomCode::new("123")));
        assert!(!p.is_in_room(&RoomCode::new("124")));

        p.room_code = None;
        assert!(!p.is_in_room(&RoomCode::new("123")));
    }

    #[test]
    fn test_connection_id_from_sequence() {
        assert_eq!(ConnectionId::from_sequence(0).as_str(), "conn-0");
        assert_eq!(ConnectionId::from_sequence(17).to_string(), "conn-17");
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(alice()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "socketId": "conn-1",
                "name": "Alice",
                "isAdmin": true,
                "roomCode": "123",
                "vote": 0
            })
        );
    }

    #[test]
    fn test_absent_room_serializes_as_null() {
        let mut p = alice();
        p.room_code = None;
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["roomCode"], serde_json::Value::Null);
    }
}
