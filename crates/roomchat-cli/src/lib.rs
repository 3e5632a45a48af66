//! Line-oriented terminal client for roomchat.
//!
//! A thin shell over [`roomchat_app::Driver`] that provides terminal I/O.
//! All orchestration lives in the generic [`roomchat_app::Runtime`]; this
//! crate parses typed lines and prints what changed.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod input;
pub mod render;
pub mod system_env;
pub mod terminal;

pub use commands::Command;
pub use input::{LineOutcome, handle_line};
pub use render::Screen;
pub use roomchat_app::{App, AppAction, AppEvent, Driver, Runtime};
pub use system_env::SystemEnv;
pub use terminal::{TerminalDriver, TerminalError};
