//! Actions produced by the App for the runtime to execute.

/// Instructions from [`App`](crate::App) to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Redraw the view.
    Render,

    /// Shut the session down and exit the event loop.
    Quit,

    /// Open the connection to the server.
    Connect,

    /// Join a room, leaving the current one first.
    JoinRoom {
        /// Display name in the room.
        username: String,
        /// Catalog room id.
        room_id: String,
        /// Shared secret for protected rooms.
        secret: Option<String>,
    },

    /// Send a message to the joined room.
    SendMessage {
        /// Message text.
        body: String,
    },

    /// Leave the joined room.
    LeaveRoom,
}
