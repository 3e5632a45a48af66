//! Events consumed by the App.

use roomchat_client::ClientError;
use roomchat_core::{ConnectionState, Message, RoomId};

/// Inputs to the [`App`](crate::App) state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Periodic tick.
    Tick,

    /// Connection state changed.
    ConnectionChanged(ConnectionState),

    /// The session log was cleared for a new join.
    LogCleared {
        /// Room the fresh log belongs to.
        room: RoomId,
    },

    /// The session log stopped accepting entries.
    LogStale,

    /// Entry appended to the session log.
    MessageDelivered(Message),

    /// Join acknowledged by the server.
    Joined {
        /// Joined room.
        room: RoomId,
        /// Identity in the room.
        username: String,
    },

    /// Left the room on request.
    Left {
        /// Room that was left.
        room: RoomId,
    },

    /// Rejection or fault to surface as a notification.
    Error(ClientError),
}
