//! Room membership payloads.

use serde::{Deserialize, Serialize};

/// Membership request.
///
/// `password` is only sent for secret-protected rooms. `request_id` carries
/// the client's join sequence number so the acknowledgement can be matched
/// to the latest attempt; servers that predate it ignore the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoom {
    /// Target room id.
    pub room: String,
    /// Display name the user wants inside the room.
    pub username: String,
    /// Shared secret for protected rooms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Join sequence number, echoed back in [`RoomJoined`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

/// Explicit leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRoom {
    /// Room being left.
    pub room: String,
}

/// Join acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomJoined {
    /// Room that was joined.
    pub room: String,
    /// Username the server accepted.
    pub username: String,
    /// Sequence number copied from the originating [`JoinRoom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}
