//! Application layer for roomchat.
//!
//! Separates the chat front-end into three layers:
//!
//! - [`App`]: pure view state machine (connection status, log mirror,
//!   notifications)
//! - [`Bridge`]: translation between [`App`] and the session
//!   [`Client`](roomchat_client::Client)
//! - [`Runtime`]: generic event loop driving both through a [`Driver`]
//!
//! Frontends implement [`Driver`] and hand it to [`Runtime`]; the same
//! orchestration runs in the terminal and in simulation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod driver;
mod event;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::{App, MAX_NOTIFICATIONS};
pub use bridge::{Bridge, TransportCommand};
pub use driver::Driver;
pub use event::AppEvent;
pub use runtime::Runtime;
pub use state::{ConnectionState, LogView, Notification};
