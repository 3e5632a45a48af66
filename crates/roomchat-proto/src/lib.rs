//! Roomchat wire protocol
//!
//! Named events exchanged between a chat client and a room server. Every
//! message travels as a JSON envelope `{"event": <name>, "data": <payload>}`,
//! the shape used by event-based socket libraries.
//!
//! # Components
//!
//! - [`ClientMessage`]: outbound events (`join_room`, `send_message`,
//!   `leave_room`)
//! - [`ServerMessage`]: inbound events (`receive_message`, `user_joined`,
//!   `user_left`, `room_joined`, `error`)
//! - [`codec`]: JSON encoding with a size limit, plus newline framing for
//!   stream transports
//!
//! Transport lifecycle signals (connect, disconnect) are not part of the JSON
//! contract; transports report them out of band.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod errors;
pub mod payloads;
pub mod timestamp;

pub use errors::{ProtocolError, Result};
pub use payloads::{
    ClientMessage, ServerMessage,
    chat::{Presence, ReceiveMessage, SendMessage},
    room::{JoinRoom, LeaveRoom, RoomJoined},
};
