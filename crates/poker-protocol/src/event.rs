//! Named room events.
//!
//! Event names are part of the wire contract shared with existing
//! clients and must not change.

use poker_core::{Participant, RoomCode, Vote};
use serde::{Deserialize, Serialize};

/// Wire names of every event.
pub mod names {
    /// Transport-level: a client channel was opened.
    pub const CONNECTION: &str = "connection";
    /// Transport-level: a client channel was closed.
    pub const DISCONNECT: &str = "disconnect";

    pub const CREATE_ROOM: &str = "Create_Room";
    pub const JOIN_ROOM: &str = "Join_Room";
    pub const TO_VOTE: &str = "To_Vote";
    pub const TRY_CHANGE_VOTE: &str = "Try_Change_Vote";
    pub const SHOW_VOTES: &str = "Show_Votes";
    pub const RESET_VOTES: &str = "Reset_Votes";

    pub const SENT_ROOM: &str = "Sent_Room";
    pub const ME: &str = "Me";
    pub const ALL_USERS: &str = "All_Users";
    pub const WHO_VOTED: &str = "Who_Voted";
    pub const WHO_TRY_CHANGE_VOTED: &str = "Who_Try_Change_Voted";
    pub const CHANGE_VISIBILITY_VOTES: &str = "Change_Visibility_Votes";
}

/// Payload of `Create_Room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Payload of `Join_Room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    pub room_code: RoomCode,
}

/// Events a client sends over its channel.
///
/// `connection` and `disconnect` are raised by the transport itself and
/// never appear as frames, so they have no variant here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum InboundEvent {
    #[serde(rename = "Create_Room")]
    CreateRoom(CreateRoomRequest),

    #[serde(rename = "Join_Room")]
    JoinRoom(JoinRoomRequest),

    #[serde(rename = "To_Vote")]
    ToVote(Vote),

    #[serde(rename = "Try_Change_Vote")]
    TryChangeVote,

    /// Carries whether votes are currently visible
    #[serde(rename = "Show_Votes")]
    ShowVotes(bool),

    #[serde(rename = "Reset_Votes")]
    ResetVotes,
}

impl InboundEvent {
    /// Returns the wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom(_) => names::CREATE_ROOM,
            Self::JoinRoom(_) => names::JOIN_ROOM,
            Self::ToVote(_) => names::TO_VOTE,
            Self::TryChangeVote => names::TRY_CHANGE_VOTE,
            Self::ShowVotes(_) => names::SHOW_VOTES,
            Self::ResetVotes => names::RESET_VOTES,
        }
    }
}

/// Events the server sends to one client or to a whole room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundEvent {
    /// Room code assigned (create) or echoed (join)
    #[serde(rename = "Sent_Room")]
    SentRoom(RoomCode),

    /// The receiving client's own record
    #[serde(rename = "Me")]
    Me(Participant),

    /// Every member of the room, in join order
    #[serde(rename = "All_Users")]
    AllUsers(Vec<Participant>),

    #[serde(rename = "Who_Voted")]
    WhoVoted(Participant),

    #[serde(rename = "Who_Try_Change_Voted")]
    WhoTryChangeVoted(Participant),

    /// New visibility of votes
    #[serde(rename = "Change_Visibility_Votes")]
    ChangeVisibilityVotes(bool),
}

impl OutboundEvent {
    /// Returns the wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SentRoom(_) => names::SENT_ROOM,
            Self::Me(_) => names::ME,
            Self::AllUsers(_) => names::ALL_USERS,
            Self::WhoVoted(_) => names::WHO_VOTED,
            Self::WhoTryChangeVoted(_) => names::WHO_TRY_CHANGE_VOTED,
            Self::ChangeVisibilityVotes(_) => names::CHANGE_VISIBILITY_VOTES,
        }
    }
}
