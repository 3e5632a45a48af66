//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`roomchat_app::Runtime`] orchestration code runs in both production and
//! simulation. User input comes from a script of [`Input`] steps, some of
//! which hold the script until the App (or the server) reaches a state.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use roomchat_app::{App, AppAction, Driver};
use roomchat_client::TransportEvent;
use roomchat_core::ConnectionState;
use roomchat_proto::ClientMessage;

use crate::{ServerSlot, SimTransport};

/// Simulated time between input polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One step of a scripted user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Ask to join a room.
    Join {
        /// Display name.
        username: String,
        /// Catalog room id.
        room_id: String,
        /// Secret for protected rooms.
        secret: Option<String>,
    },
    /// Send a message to the joined room.
    Send(String),
    /// Leave the joined room.
    Leave,
    /// Dismiss the oldest notification.
    Dismiss,
    /// Do nothing for a while.
    Pause(Duration),
    /// Hold until the App shows a joined room.
    AwaitJoined,
    /// Hold until the App log holds an entry with this body.
    AwaitEntry(String),
    /// Hold until this many transports were opened and the latest is up.
    AwaitConnects(usize),
    /// Hold until the server lists this many members in a room.
    AwaitMembers {
        /// Room id.
        room: String,
        /// Member count.
        count: usize,
    },
    /// Have the server drop every connection.
    DropConnections,
    /// Quit the application.
    Quit,
}

impl Input {
    /// Join without a secret.
    pub fn join(username: &str, room_id: &str) -> Self {
        Self::Join { username: username.into(), room_id: room_id.into(), secret: None }
    }

    /// Send a message.
    pub fn send(body: &str) -> Self {
        Self::Send(body.into())
    }

    /// Wait for a log entry.
    pub fn await_entry(body: &str) -> Self {
        Self::AwaitEntry(body.into())
    }

    /// Wait for room membership on the server.
    pub fn await_members(room: &str, count: usize) -> Self {
        Self::AwaitMembers { room: room.into(), count }
    }
}

/// What the driver observed, shared with the test.
#[derive(Debug, Clone, Default)]
pub struct SimRecord {
    /// Transports opened.
    pub connects: usize,
    /// Envelopes written, in order.
    pub sent: Vec<ClientMessage>,
    /// Distinct connection states seen at render time, in order.
    pub states: Vec<ConnectionState>,
    /// App as of the last render.
    pub last_frame: Option<App>,
    /// Driver was stopped.
    pub stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] trait so the same [`roomchat_app::Runtime`]
/// orchestration code runs in both the terminal and simulation tests.
pub struct SimDriver {
    script: VecDeque<Input>,
    poll_interval: Duration,
    /// End of the running [`Input::Pause`].
    resume_at: Option<tokio::time::Instant>,
    transport: Option<SimTransport>,
    server: Option<ServerSlot>,
    record: Arc<Mutex<SimRecord>>,
}

impl SimDriver {
    /// Create a driver that plays `script`, then quits.
    pub fn new(script: Vec<Input>) -> Self {
        Self {
            script: script.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            resume_at: None,
            transport: None,
            server: None,
            record: Arc::new(Mutex::new(SimRecord::default())),
        }
    }

    /// Give the script access to the server for membership waits and
    /// dropped connections.
    #[must_use]
    pub fn with_server(mut self, slot: ServerSlot) -> Self {
        self.server = Some(slot);
        self
    }

    /// Override the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Shared record, readable after the runtime has finished.
    pub fn record(&self) -> Arc<Mutex<SimRecord>> {
        Arc::clone(&self.record)
    }

    /// Script steps not yet played.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn update_record(&self, update: impl FnOnce(&mut SimRecord)) {
        match self.record.lock() {
            Ok(mut record) => update(&mut record),
            Err(poisoned) => update(&mut poisoned.into_inner()),
        }
    }

    fn connects(&self) -> usize {
        match self.record.lock() {
            Ok(record) => record.connects,
            Err(poisoned) => poisoned.into_inner().connects,
        }
    }

    /// Whether the head of the script may run now.
    fn ready(&mut self, app: &App) -> bool {
        let Some(input) = self.script.front() else {
            return true;
        };

        match input {
            Input::Pause(duration) => {
                let now = tokio::time::Instant::now();
                let until = *self.resume_at.get_or_insert(now + *duration);
                now >= until
            },
            Input::AwaitJoined => app.current_room().is_some(),
            Input::AwaitEntry(body) => app.messages().iter().any(|m| &m.body == body),
            Input::AwaitConnects(count) => {
                self.connects() >= *count && app.connection_state() == ConnectionState::Connected
            },
            Input::AwaitMembers { room, count } => self
                .server
                .as_ref()
                .and_then(ServerSlot::get)
                .is_some_and(|server| {
                    server.snapshot().rooms.get(room).map_or(0, |members| members.len()) >= *count
                }),
            Input::DropConnections => self.server.as_ref().and_then(ServerSlot::get).is_some(),
            _ => true,
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = tokio::time::Instant;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        tokio::time::sleep(self.poll_interval).await;

        if !self.ready(app) {
            return Ok(Vec::new());
        }
        self.resume_at = None;

        let actions = match self.script.pop_front() {
            Some(Input::Join { username, room_id, secret }) => {
                app.join_room(username, room_id, secret)
            },
            Some(Input::Send(body)) => app.send_message(body),
            Some(Input::Leave) => app.leave_room(),
            Some(Input::Dismiss) => app.dismiss_notification(),
            Some(Input::DropConnections) => {
                if let Some(server) = self.server.as_ref().and_then(ServerSlot::get) {
                    server.drop_connections();
                }
                Vec::new()
            },
            Some(
                Input::Pause(_)
                | Input::AwaitJoined
                | Input::AwaitEntry(_)
                | Input::AwaitConnects(_)
                | Input::AwaitMembers { .. },
            ) => Vec::new(),
            Some(Input::Quit) | None => app.quit(),
        };
        Ok(actions)
    }

    async fn connect(&mut self, addr: &str) -> Result<(), Self::Error> {
        self.transport = None;
        self.update_record(|record| record.connects += 1);

        let transport =
            SimTransport::connect(addr).await.map_err(|e| SimDriverError(e.to_string()))?;
        self.transport = Some(transport);
        Ok(())
    }

    async fn send(&mut self, message: ClientMessage) -> Result<(), Self::Error> {
        let transport =
            self.transport.as_mut().ok_or_else(|| SimDriverError("not connected".into()))?;
        transport.send(&message).await.map_err(|e| SimDriverError(e.to_string()))?;
        self.update_record(|record| record.sent.push(message));
        Ok(())
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        let event = self.transport.as_mut()?.try_recv()?;
        if matches!(event, TransportEvent::Disconnected { .. }) {
            self.transport = None;
        }
        Some(event)
    }

    async fn disconnect(&mut self) {
        self.transport = None;
    }

    fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let state = app.connection_state();
        self.update_record(|record| {
            if record.states.last() != Some(&state) {
                record.states.push(state);
            }
            record.last_frame = Some(app.clone());
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.transport = None;
        self.update_record(|record| record.stopped = true);
    }
}
