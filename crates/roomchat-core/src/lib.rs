//! Roomchat core
//!
//! Pure, I/O-free building blocks for the session client: the environment
//! abstraction, the static room catalog, the per-membership message log and
//! the connection lifecycle state machine.
//!
//! Every type here follows the action pattern: methods take the current time
//! as input and return actions for a driver to execute. Nothing spawns tasks
//! or touches the network, which keeps behavior deterministic under
//! simulation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod env;
pub mod error;
pub mod log;
pub mod room;

pub use connection::{
    Connection, ConnectionAction, ConnectionConfig, ConnectionState, ReconnectPolicy,
};
pub use env::Environment;
pub use error::ConnectionError;
pub use log::{Message, MessageKind, MessageLog, PresenceChange};
pub use room::{Room, RoomCatalog, RoomId};
