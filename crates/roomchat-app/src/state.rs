//! View state types owned by the App.

use roomchat_core::{Message, RoomId};
pub use roomchat_core::ConnectionState;

/// A queued, dismissible error notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Position in the order notifications were raised, starting at 1.
    pub seq: u64,
    /// Text shown to the user.
    pub message: String,
    /// Whether retrying later may succeed.
    pub transient: bool,
}

/// Mirror of the session message log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogView {
    /// Room the entries belong to. `None` before the first join.
    pub room: Option<RoomId>,
    /// Entries in delivery order.
    pub entries: Vec<Message>,
    /// No further entries will arrive until the next join.
    pub stale: bool,
    /// Number of times the log was cleared for a join.
    pub generation: u64,
}
