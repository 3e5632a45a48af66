//! Read-only session view.

use roomchat_core::{ConnectionState, RoomId};

/// Connection, membership and identity as seen by the user.
///
/// Built from the client's state on demand. `current_room` and `identity`
/// are only ever set while connected with an acknowledged join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Transport state.
    pub connection_state: ConnectionState,
    /// Joined room.
    pub current_room: Option<RoomId>,
    /// Username in the joined room.
    pub identity: Option<String>,
}

impl Session {
    /// Whether a join has been acknowledged on the live connection.
    pub fn is_joined(&self) -> bool {
        self.current_room.is_some()
    }
}
