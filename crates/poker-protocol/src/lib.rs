//! Poker Protocol - Wire protocol for room events
//!
//! This crate provides the named events exchanged between browser
//! clients and the room server, and the JSON text-frame envelope
//! that carries them.

pub mod event;
pub mod frame;

pub use event::{names, CreateRoomRequest, InboundEvent, JoinRoomRequest, OutboundEvent};
pub use frame::{decode_inbound, encode_outbound, ProtocolError, RawFrame, MAX_FRAME_SIZE};
