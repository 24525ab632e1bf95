//! Poker Core - Shared types for planning-poker rooms
//!
//! This crate provides the domain types shared between the wire
//! protocol (poker-protocol) and the room server (pokerd).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod participant;
pub mod room;

// Re-exports for convenience
pub use participant::{ConnectionId, Participant, Vote, NO_VOTE};
pub use room::{RoomCode, ROOM_CODE_LEN};
