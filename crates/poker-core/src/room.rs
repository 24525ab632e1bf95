//! Room codes.
//!
//! A room is not a stored entity: it is the set of participants that
//! share the same [`RoomCode`]. The code is all that identifies it.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of digits in a generated room code.
pub const ROOM_CODE_LEN: usize = 3;

/// Identifier shared by every participant of a room.
///
/// Generated codes are exactly [`ROOM_CODE_LEN`] ASCII digits with leading
/// zeros preserved ("007"). Codes supplied by joining clients are taken
/// as-is, so a `RoomCode` built with [`RoomCode::new`] may hold any string.
///
/// There is no collision check: two rooms created independently can
/// receive the same code and will then share broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps a client-supplied code without validation.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates a fresh code from three independent uniform digits.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self(code)
    }

    /// Returns true if the code has the shape of a generated code.
    #[must_use]
    pub fn is_generated_format(&self) -> bool {
        self.0.len() == ROOM_CODE_LEN && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RoomCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for RoomCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
