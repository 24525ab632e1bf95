//! JSON text-frame envelope.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`.
//! Events without a payload may omit `data` or send `null`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::event::{names, InboundEvent, OutboundEvent};

/// Maximum accepted size of an inbound frame (64 KiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Envelope as received, before the payload is interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Errors decoding or encoding frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Event {0} is reserved for the transport")]
    ReservedEvent(String),

    #[error("Invalid payload for {event}: {reason}")]
    InvalidPayload { event: String, reason: String },

    #[error("Failed to encode {event}: {reason}")]
    Encode { event: String, reason: String },
}

/// Decodes a client text frame into an [`InboundEvent`].
pub fn decode_inbound(text: &str) -> Result<InboundEvent, ProtocolError> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: text.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let raw: RawFrame =
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    match raw.event.as_str() {
        names::CREATE_ROOM => Ok(InboundEvent::CreateRoom(payload(&raw)?)),
        names::JOIN_ROOM => Ok(InboundEvent::JoinRoom(payload(&raw)?)),
        names::TO_VOTE => Ok(InboundEvent::ToVote(payload(&raw)?)),
        names::TRY_CHANGE_VOTE => Ok(InboundEvent::TryChangeVote),
        names::SHOW_VOTES => Ok(InboundEvent::ShowVotes(payload(&raw)?)),
        names::RESET_VOTES => Ok(InboundEvent::ResetVotes),
        names::CONNECTION | names::DISCONNECT => Err(ProtocolError::ReservedEvent(raw.event)),
        _ => Err(ProtocolError::UnknownEvent(raw.event)),
    }
}

/// Encodes an [`OutboundEvent`] as a text frame.
pub fn encode_outbound(event: &OutboundEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(|e| ProtocolError::Encode {
        event: event.name().to_string(),
        reason: e.to_string(),
    })
}

fn payload<T: DeserializeOwned>(raw: &RawFrame) -> Result<T, ProtocolError> {
    T::deserialize(&raw.data).map_err(|e| ProtocolError::InvalidPayload {
        event: raw.event.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CreateRoomRequest, JoinRoomRequest};
    use poker_core::{ConnectionId, Participant, RoomCode};

    #[test]
    fn test_decode_create_room() {
        let event = decode_inbound(r#"{"event":"Create_Room","data":{"name":"A","isAdmin":true}}"#)
            .unwrap();
        assert_eq!(
            event,
            InboundEvent::CreateRoom(CreateRoomRequest {
                name: "A".to_string(),
                is_admin: true,
            })
        );
    }

    #[test]
    fn test_decode_create_room_ignores_extra_fields() {
        // Browser clients send their whole user object.
        let text = r#"{"event":"Create_Room","data":{"name":"A","isAdmin":false,"vote":0,"roomCode":null}}"#;
        assert!(matches!(
            decode_inbound(text).unwrap(),
            InboundEvent::CreateRoom(_)
        ));
    }

    #[test]
    fn test_decode_join_room() {
        let text = r#"{"event":"Join_Room","data":{"name":"B","isAdmin":false,"roomCode":"007"}}"#;
        assert_eq!(
            decode_inbound(text).unwrap(),
            InboundEvent::JoinRoom(JoinRoomRequest {
                name: "B".to_string(),
                is_admin: false,
                room_code: RoomCode::new("007"),
            })
        );
    }

    #[test]
    fn test_decode_scalar_payloads() {
        assert_eq!(
            decode_inbound(r#"{"event":"To_Vote","data":13}"#).unwrap(),
            InboundEvent::ToVote(13)
        );
        assert_eq!(
            decode_inbound(r#"{"event":"Show_Votes","data":false}"#).unwrap(),
            InboundEvent::ShowVotes(false)
        );
    }

    #[test]
    fn test_decode_unit_events_with_or_without_data() {
        assert_eq!(
            decode_inbound(r#"{"event":"Reset_Votes"}"#).unwrap(),
            InboundEvent::ResetVotes
        );
        assert_eq!(
            decode_inbound(r#"{"event":"Try_Change_Vote","data":null}"#).unwrap(),
            InboundEvent::TryChangeVote
        );
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode_inbound("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode_inbound(r#"{"event":"Dance"}"#),
            Err(ProtocolError::UnknownEvent(name)) if name == "Dance"
        ));
        assert!(matches!(
            decode_inbound(r#"{"event":"disconnect"}"#),
            Err(ProtocolError::ReservedEvent(_))
        ));
        assert!(matches!(
            decode_inbound(r#"{"event":"To_Vote","data":"five"}"#),
            Err(ProtocolError::InvalidPayload { .. })
        ));
        assert!(matches!(
            decode_inbound(r#"{"event":"Join_Room","data":{"name":"B"}}"#),
            Err(ProtocolError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_frame() {
        let text = format!(
            r#"{{"event":"Create_Room","data":{{"name":"{}"}}}}"#,
            "x".repeat(MAX_FRAME_SIZE)
        );
        assert!(matches!(
            decode_inbound(&text),
            Err(ProtocolError::FrameTooLarge { max: MAX_FRAME_SIZE, .. })
        ));
    }

    #[test]
    fn test_encode_me() {
        let p = Participant::new(ConnectionId::new("conn-9"), "Ann", true, RoomCode::new("321"));
        let text = encode_outbound(&OutboundEvent::Me(p)).unwrap();
        assert!(text.contains("\"event\":\"Me\""));
        assert!(text.contains("\"socketId\":\"conn-9\""));
        assert!(text.contains("\"isAdmin\":true"));
    }
}
