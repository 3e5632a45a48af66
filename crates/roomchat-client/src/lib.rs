//! Client
//!
//! Action-based session client for room-based chat. Owns the connection
//! lifecycle, room membership and the ordered message log for the active
//! room.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and Action-Based patterns as
//! [`roomchat_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`])
//! for the caller to execute.
//!
//! # Components
//!
//! - [`Client`]: Session state machine for one user
//! - [`Session`]: Read-only view of connection, room and identity
//! - [`ClientEvent`]: Events fed into the client
//! - [`ClientAction`]: Actions produced by the client
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedClient`]: Channels bridged to a WebSocket
//! - [`transport::connect`]: Connect to a server

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::{
    Client, ClientConfig, DEFAULT_JOIN_TIMEOUT, DEFAULT_MAX_JOIN_RETRIES, DEFAULT_SEND_TIMEOUT,
};
pub use error::{ClientError, SendFailure, ValidationError};
pub use event::{ClientAction, ClientEvent, TransportEvent};
pub use roomchat_core::{
    ConnectionState, Environment, Message, MessageKind, MessageLog, Room, RoomCatalog, RoomId,
};
pub use session::Session;
