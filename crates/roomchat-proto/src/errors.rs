//! Protocol errors.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding wire messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload is not valid JSON or does not match any known event.
    #[error("invalid message: {0}")]
    Json(String),

    /// Encoded message exceeds [`crate::codec::MAX_MESSAGE_SIZE`].
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge {
        /// Size of the offending message in bytes.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Empty input where a message was expected.
    #[error("empty message")]
    Empty,
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
