//! Front-end I/O seam.
//!
//! A [`Driver`] supplies user input, one transport at a time, a clock and
//! output. Everything else, including reconnect timing, lives in
//! [`crate::Runtime`] and below.

use std::{future::Future, ops::Sub, time::Duration};

use roomchat_client::TransportEvent;
use roomchat_proto::ClientMessage;

use crate::{App, AppAction};

/// I/O for one front-end.
///
/// The terminal and the simulation both implement it, so the code under
/// test in simulation is the code the terminal runs.
///
/// # Implementations
///
/// - **Terminal**: stdin lines for input, WebSocket transport
/// - **Simulation**: turmoil TCP streams with line-delimited envelopes
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): the front-end's own error
/// - [`Instant`](Driver::Instant): wall time in the terminal, virtual time
///   under turmoil
pub trait Driver: Send {
    /// Failure to read input, write output or reach the server.
    type Error: std::error::Error + Send + 'static;

    /// Clock reading; must match the session environment's.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Poll for user input and translate it through the App's intent API.
    ///
    /// Returns the resulting actions, empty if no input is ready.
    fn poll_event(
        &mut self,
        app: &mut App,
    ) -> impl Future<Output = Result<Vec<AppAction>, Self::Error>> + Send;

    /// Open a fresh transport to `addr`, dropping any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn connect(&mut self, addr: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a message on the live transport.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no transport or the write fails.
    fn send(
        &mut self,
        message: ClientMessage,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive the next transport event.
    ///
    /// Returns `None` if no event is ready.
    fn recv(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send;

    /// Close the live transport, if any, after flushing what was already
    /// queued on it.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;

    /// Check if a transport is live.
    fn is_connected(&self) -> bool;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Show the App.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop the driver and clean up resources.
    fn stop(&mut self);
}
