//! Event envelopes.
//!
//! Both directions use serde's adjacent tagging, so a message serializes as
//! `{"event": "<snake_case name>", "data": <payload>}`. The event names are
//! the contract other implementations must honor; renaming a variant is a
//! breaking protocol change.

pub mod chat;
pub mod room;

use serde::{Deserialize, Serialize};

/// Events sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request membership of a room.
    JoinRoom(room::JoinRoom),
    /// Publish a message to a room.
    SendMessage(chat::SendMessage),
    /// Give up membership of a room.
    LeaveRoom(room::LeaveRoom),
}

impl ClientMessage {
    /// Wire-level event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "join_room",
            Self::SendMessage(_) => "send_message",
            Self::LeaveRoom(_) => "leave_room",
        }
    }

    /// Room this message targets.
    pub fn room(&self) -> &str {
        match self {
            Self::JoinRoom(p) => &p.room,
            Self::SendMessage(p) => &p.room,
            Self::LeaveRoom(p) => &p.room,
        }
    }
}

/// Events sent from the server to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A message broadcast to the room, including the sender's own echo.
    ReceiveMessage(chat::ReceiveMessage),
    /// A user joined the room.
    UserJoined(chat::Presence),
    /// A user left the room.
    UserLeft(chat::Presence),
    /// Acknowledgement of a `join_room` request.
    RoomJoined(room::RoomJoined),
    /// Join or send rejected, or a server fault. Carries a human-readable
    /// reason.
    Error(String),
}

impl ServerMessage {
    /// Wire-level event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ReceiveMessage(_) => "receive_message",
            Self::UserJoined(_) => "user_joined",
            Self::UserLeft(_) => "user_left",
            Self::RoomJoined(_) => "room_joined",
            Self::Error(_) => "error",
        }
    }
}
