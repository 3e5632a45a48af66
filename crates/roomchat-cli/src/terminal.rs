//! Terminal driver for the line client.
//!
//! Implements the [`Driver`] trait with stdin lines for input and plain
//! appended lines for output. Network uses the WebSocket transport.

use std::{
    io::{self, Stdout, Write},
    time::{Duration, Instant},
};

use roomchat_app::{App, AppAction, AppEvent, Driver};
use roomchat_client::{
    TransportEvent,
    transport::{self, ConnectedClient, DEFAULT_CLOSE_GRACE, TransportError},
};
use roomchat_core::ConnectionConfig;
use roomchat_proto::ClientMessage;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::{Screen, input};

/// How long to wait for input before ticking.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Send attempted without a live connection.
    #[error("not connected")]
    NotConnected,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Reads commands and messages from stdin, one per line, and prints what
/// changed after every render.
pub struct TerminalDriver {
    lines: Lines<BufReader<Stdin>>,
    /// Stdin has not reached end of file.
    input_open: bool,
    out: Stdout,
    screen: Screen,
    connection: Option<ConnectedClient>,
    /// Bound on the WebSocket handshake.
    connect_timeout: Duration,
}

impl Default for TerminalDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalDriver {
    /// Create a new terminal driver on stdin and stdout.
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            input_open: true,
            out: io::stdout(),
            screen: Screen::new(),
            connection: None,
            connect_timeout: ConnectionConfig::default().connect_timeout,
        }
    }

    /// Give up on a handshake after `timeout`; the failure then feeds the
    /// reconnect schedule like any other.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn print(&self, lines: &[String]) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut out = self.out.lock();
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        tokio::select! {
            biased;

            line = self.lines.next_line(), if self.input_open => {
                match line? {
                    Some(line) => {
                        let outcome = input::handle_line(&line, app);
                        self.print(&outcome.output)?;
                        Ok(outcome.actions)
                    },
                    // End of input quits, the same as /quit
                    None => {
                        self.input_open = false;
                        Ok(app.quit())
                    },
                }
            }

            () = tokio::time::sleep(TICK_INTERVAL) => {
                Ok(app.handle(AppEvent::Tick))
            }
        }
    }

    async fn connect(&mut self, addr: &str) -> Result<(), Self::Error> {
        self.connection = None;
        let client = transport::connect(addr, self.connect_timeout).await?;
        self.connection = Some(client);
        Ok(())
    }

    async fn send(&mut self, message: ClientMessage) -> Result<(), Self::Error> {
        let connection = self.connection.as_ref().ok_or(TerminalError::NotConnected)?;
        connection.send(message).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        let event = self.connection.as_mut()?.from_server.try_recv().ok()?;
        if matches!(event, TransportEvent::Disconnected { .. }) {
            self.connection = None;
        }
        Some(event)
    }

    async fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close(DEFAULT_CLOSE_GRACE).await;
        }
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let lines = self.screen.update(app);
        self.print(&lines)?;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.stop();
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
