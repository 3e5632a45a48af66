//! Room catalog.
//!
//! Rooms are known to the client ahead of connection. The catalog is static:
//! servers do not advertise rooms, and a join for an id outside the catalog
//! is rejected before it reaches the transport.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Room identifier as used on the wire (`"general"`, `"admin"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a raw id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for RoomId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RoomId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Wire id.
    pub id: RoomId,
    /// Human-readable name.
    pub display_name: String,
    /// Joining requires a shared secret, checked server-side.
    pub requires_secret: bool,
}

impl Room {
    /// Build an entry.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        requires_secret: bool,
    ) -> Self {
        Self { id: RoomId::new(id), display_name: display_name.into(), requires_secret }
    }
}

/// Standard rooms: (id, display name, requires secret).
const STANDARD_ROOMS: &[(&str, &str, bool)] = &[
    ("general", "General", false),
    ("gaming", "Gaming", false),
    ("music", "Music", false),
    ("coding", "Coding", false),
    ("tech", "Tech", false),
    ("politics", "Politics", false),
    ("admin", "Admin", true),
];

/// Ordered list of joinable rooms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomCatalog {
    rooms: Vec<Room>,
}

impl RoomCatalog {
    /// Catalog with the given rooms, in display order.
    pub fn new(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    /// The standard catalog. `admin` is the only secret-protected room.
    pub fn standard() -> Self {
        Self::new(
            STANDARD_ROOMS
                .iter()
                .map(|&(id, name, requires_secret)| Room::new(id, name, requires_secret))
                .collect(),
        )
    }

    /// Room with the given id. `None` if not in the catalog.
    pub fn get(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    /// Whether the catalog contains `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Rooms in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    /// Number of rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the catalog has no rooms.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
