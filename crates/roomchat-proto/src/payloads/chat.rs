//! Chat payloads: messages and presence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outbound message. The server echoes it back to every member, sender
/// included, as a [`ReceiveMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    /// Message text.
    pub message: String,
    /// Target room id.
    pub room: String,
}

/// Message broadcast to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveMessage {
    /// Username of the sender.
    pub author: String,
    /// Message text.
    pub message: String,
    /// Server-assigned time. Not comparable across clients.
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Presence broadcast, used for both `user_joined` and `user_left`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// User whose presence changed.
    pub username: String,
    /// Server-assigned time.
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}
