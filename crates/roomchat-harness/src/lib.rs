//! Deterministic simulation harness for roomchat session testing.
//!
//! Turmoil-based implementations of the Environment and Driver traits for
//! deterministic, reproducible testing under various network conditions,
//! plus a sans-IO reference [`ChatServer`] that speaks the wire protocol.
//!
//! # Model-Based Testing
//!
//! The `model` module wires several App/Bridge pairs to one in-memory
//! [`ChatServer`] with synchronous delivery. Random [`Operation`]s are
//! applied and the whole system is checked after every step.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for per-client
//! App/Bridge invariants and [`InvariantRegistry::quiescent()`] when no
//! messages are in flight.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chat_server;
pub mod invariants;
pub mod model;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;
pub mod sim_transport;

pub use chat_server::{
    ChatServer, DEFAULT_ROOM_SECRET, ServerAction, ServerConfig, ServerEvent,
};
pub use invariants::{
    ClientSnapshot, IdentityMatchesRoom, Invariant, InvariantKind, InvariantRegistry,
    InvariantResult, JoinedImpliesConnected, LogMirrorsClient, MessageOrderAgreement,
    NotificationBound, ServerMembership, ServerSnapshot, SystemSnapshot, Violation,
};
pub use model::{ClientId, ModelWorld, Operation, SmallMessage};
pub use sim_driver::{DEFAULT_POLL_INTERVAL, Input, SimDriver, SimDriverError, SimRecord};
pub use sim_env::SimEnv;
pub use sim_server::{ServerHandle, ServerSlot, SimServer};
pub use sim_transport::SimTransport;
