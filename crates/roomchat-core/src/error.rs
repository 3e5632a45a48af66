//! Error types for the connection lifecycle.
//!
//! Transport failures are carried as strings: the concrete transport
//! (WebSocket, simulated TCP) lives outside this crate and its error types
//! must not leak into the state machine.

use std::time::Duration;

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors raised by the connection state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: String,
    },

    /// Transport did not signal connected within the connect timeout
    #[error("connect timeout after {elapsed:?}")]
    ConnectTimeout {
        /// How long we waited
        elapsed: Duration,
    },

    /// Underlying transport error
    #[error("transport error: {0}")]
    Transport(String),
}

impl ConnectionError {
    /// Returns true if this error may succeed on retry.
    ///
    /// Timeouts and transport failures are retried by the reconnect policy.
    /// An invalid transition is a caller bug and never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. } | Self::Transport(_))
    }
}
