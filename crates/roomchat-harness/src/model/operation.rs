//! Operations for model-based testing.
//!
//! Operations represent all possible actions in the system. They are generated
//! randomly by proptest and applied to the world.

use arbitrary::Arbitrary;

/// Client identifier (0-indexed, wrapped to the world size).
pub type ClientId = u8;

/// Usernames the generator picks from.
pub const USERNAMES: [&str; 4] = ["alice", "bob", "carol", "dave"];

/// Room ids the generator picks from. The last one is not in the catalog.
pub const ROOM_IDS: [&str; 4] = ["general", "music", "admin", "nowhere"];

/// Operations that can be applied to the system.
///
/// Each operation targets a specific client. Operations are designed to be
/// small and composable so proptest can explore interesting combinations.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Client joins a room.
    Join {
        /// Client performing the operation.
        client_id: ClientId,
        /// Index into [`USERNAMES`].
        user: u8,
        /// Index into [`ROOM_IDS`].
        room: u8,
        /// Supply the server's room secret.
        with_secret: bool,
    },

    /// Client sends a message to its room.
    SendMessage {
        /// Client sending the message.
        client_id: ClientId,
        /// Message content.
        content: SmallMessage,
    },

    /// Client leaves its room.
    LeaveRoom {
        /// Client leaving.
        client_id: ClientId,
    },

    /// The server drops the client's connection.
    Disconnect {
        /// Client losing its transport.
        client_id: ClientId,
    },

    /// Client closes its session and opens a new one.
    Restart {
        /// Client restarting.
        client_id: ClientId,
    },

    /// Advance simulation time and tick every client.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },

    /// Deliver every queued server message.
    DeliverPending,
}

/// Small message content for testing.
///
/// The world appends a sequence number so every body is unique.
#[derive(Debug, Clone, Arbitrary)]
pub struct SmallMessage {
    /// Content seed.
    pub seed: u8,
    /// Size class (0 maps to a whitespace-only body).
    pub size_class: u8,
}

impl SmallMessage {
    /// Expand to a body, unique per `sequence` unless blank.
    pub fn to_body(&self, sequence: u64) -> String {
        let len = match self.size_class % 4 {
            0 => return "   ".to_string(),
            1 => 1,
            2 => 8,
            _ => 32,
        };
        let word: String =
            (0..len).map(|i| char::from(b'a' + self.seed.wrapping_add(i) % 26)).collect();
        format!("{word}-{sequence}")
    }
}
