//! Model-based testing over the real session stack.
//!
//! [`ModelWorld`] connects several App/Bridge pairs to one in-memory
//! [`ChatServer`](crate::ChatServer). Client-to-server messages are handled
//! immediately; server-to-client messages queue until delivered, so
//! operations interleave with messages in flight.

mod operation;
mod world;

pub use operation::{ClientId, Operation, SmallMessage};
pub use world::ModelWorld;
