//! Client error types.
//!
//! Returned directly from [`Client::handle`](crate::Client::handle) when an
//! intent is rejected locally, and carried in
//! [`ClientAction::Notify`](crate::ClientAction::Notify) for failures that
//! arrive asynchronously. Neither kind is fatal: the client stays usable.

use roomchat_core::ConnectionError;
use thiserror::Error;

/// Input rejected before anything reaches the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty or whitespace
    #[error("username must not be empty")]
    EmptyUsername,

    /// Message body is empty or whitespace
    #[error("message must not be empty")]
    EmptyMessage,

    /// Room id is not in the catalog
    #[error("unknown room: {room}")]
    UnknownRoom {
        /// Requested room id
        room: String,
    },

    /// Protected room requested without a secret
    #[error("room {room} requires a secret")]
    MissingSecret {
        /// Requested room id
        room: String,
    },
}

/// Why a send did not make it into the log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendFailure {
    /// Not a member of any room
    #[error("not joined to a room")]
    NotJoined,
    /// No echo within the send timeout
    #[error("no confirmation from server")]
    Timeout,
    /// Connection dropped before the echo
    #[error("connection lost")]
    Disconnected,
    /// Server reported an error
    #[error("{0}")]
    Server(String),
}

/// Errors produced by the session client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Invalid user input
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Intent requires a live connection
    #[error("not connected")]
    NotConnected,

    /// Server refused the join, or it was never acknowledged
    #[error("could not join {room}: {reason}")]
    JoinRejected {
        /// Room that was requested
        room: String,
        /// Server reason or local timeout description
        reason: String,
    },

    /// Message was not delivered
    #[error("message not sent: {0}")]
    SendRejected(SendFailure),

    /// Transport failed and reconnection was abandoned
    #[error("transport fault: {reason}")]
    TransportFault {
        /// Failure description
        reason: String,
    },

    /// Server error not tied to a pending join or send
    #[error("server error: {reason}")]
    ServerFault {
        /// Server-provided reason
        reason: String,
    },

    /// Connection state machine error
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
}

impl ClientError {
    /// Returns true if repeating the same intent later may succeed without
    /// changing it.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NotConnected | Self::TransportFault { .. } => true,
            Self::SendRejected(failure) => {
                matches!(failure, SendFailure::Timeout | SendFailure::Disconnected)
            },
            Self::Connection(error) => error.is_transient(),
            Self::Validation(_)
            | Self::JoinRejected { .. }
            | Self::ServerFault { .. } => false,
        }
    }
}
