//! Per-membership message log.
//!
//! The log belongs to exactly one room membership. Joining (or rejoining)
//! replaces it wholesale; there is no history merge. Order is receipt order
//! from the transport, never timestamp order: timestamps come from other
//! clients' clocks via the server and are only displayed.
//!
//! # Invariants
//!
//! - Entries are immutable once appended.
//! - A stale log (after a leave or disconnect) accepts no appends until the
//!   next [`MessageLog::reset`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::room::RoomId;

/// Kind of log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Text authored by a user (including our own echoed sends)
    UserMessage,
    /// Synthetic join/leave entry
    Presence,
}

/// Direction of a presence change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceChange {
    /// User entered the room
    Joined,
    /// User left the room
    Left,
}

impl PresenceChange {
    fn verb(self) -> &'static str {
        match self {
            Self::Joined => "joined",
            Self::Left => "left",
        }
    }
}

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Entry kind
    pub kind: MessageKind,
    /// Author. `None` for presence entries.
    pub author: Option<String>,
    /// Rendered text
    pub body: String,
    /// Server-reported time, display only
    pub occurred_at: DateTime<Utc>,
}

impl Message {
    /// A user-authored message.
    pub fn user(
        author: impl Into<String>,
        body: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: MessageKind::UserMessage,
            author: Some(author.into()),
            body: body.into(),
            occurred_at,
        }
    }

    /// A presence entry with the body `"<username> joined"` or
    /// `"<username> left"`.
    pub fn presence(username: &str, change: PresenceChange, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind: MessageKind::Presence,
            author: None,
            body: format!("{username} {}", change.verb()),
            occurred_at,
        }
    }
}

/// Ordered log for the current (or last) room membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    room: Option<RoomId>,
    entries: Vec<Message>,
    stale: bool,
}

impl MessageLog {
    /// Empty log with no room.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all entries and scope the log to `room`. Clears the stale
    /// flag.
    pub fn reset(&mut self, room: RoomId) {
        self.room = Some(room);
        self.entries.clear();
        self.stale = false;
    }

    /// Append an entry. Returns `false` (and drops the entry) if the log is
    /// stale or not scoped to a room.
    pub fn append(&mut self, message: Message) -> bool {
        if self.stale || self.room.is_none() {
            return false;
        }
        self.entries.push(message);
        true
    }

    /// Retain entries for display but refuse further appends.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Entries in receipt order.
    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    /// Whether appends are refused.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Room the log is scoped to.
    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
