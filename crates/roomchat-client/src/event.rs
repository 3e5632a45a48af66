//! Client events and actions.

use roomchat_core::{ConnectionState, Message, RoomId};
use roomchat_proto::{ClientMessage, ServerMessage};

use crate::error::ClientError;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Creating transports and reporting their lifecycle
/// - Forwarding inbound server events
/// - Driving time forward via ticks
/// - Forwarding user intents (join, send, leave)
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and simulation (`tokio::time::Instant`)
/// environments.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// User wants to connect.
    Open,

    /// The transport requested by the last `Connect` action is up.
    TransportConnected,

    /// The transport closed.
    TransportDisconnected {
        /// Close reason from the transport.
        reason: String,
    },

    /// The transport failed and must be discarded.
    TransportFault {
        /// Failure description.
        reason: String,
    },

    /// User wants to join a room.
    JoinRoom {
        /// Display name; trimmed before sending.
        username: String,
        /// Catalog room id.
        room_id: String,
        /// Shared secret for protected rooms.
        secret: Option<String>,
    },

    /// User wants to send a message to the joined room.
    SendMessage {
        /// Message text.
        body: String,
    },

    /// User wants to leave the joined room.
    LeaveRoom,

    /// User shutdown. No reconnect follows.
    Close,

    /// Event received from the server.
    Inbound(ServerMessage),

    /// Time tick for timeout processing.
    ///
    /// The caller should send ticks periodically so the client can detect
    /// connect, join and send timeouts and fire scheduled reconnects.
    Tick {
        /// Current time from the environment.
        now: I,
    },
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Create a new transport instance and connect it.
    Connect {
        /// Reconnect attempt, 0 for the initial connect.
        attempt: u32,
    },

    /// Discard the current transport instance.
    CloseTransport {
        /// Reason for closing.
        reason: String,
    },

    /// Send a message to the server.
    Send(ClientMessage),

    /// Connection state changed.
    ConnectionChanged(ConnectionState),

    /// The message log was cleared for a new membership.
    LogCleared {
        /// Room the fresh log belongs to.
        room: RoomId,
    },

    /// An entry was appended to the message log.
    Deliver(Message),

    /// Join acknowledged.
    Joined {
        /// Joined room.
        room: RoomId,
        /// Identity in that room.
        username: String,
    },

    /// Membership, or the join still in flight, ended by the user.
    Left {
        /// Room that was left or no longer joined.
        room: RoomId,
    },

    /// Asynchronous failure to surface to the user.
    Notify(ClientError),
}

/// Events produced by a transport instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Decoded server event.
    Message(ServerMessage),

    /// Transport closed or failed; no further events follow.
    Disconnected {
        /// Close reason.
        reason: String,
    },
}
