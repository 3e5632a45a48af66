//! Event loop shared by every front-end.
//!
//! One [`Runtime`] owns a session and steps three parties in turn:
//! - [`App`]: view state machine
//! - [`Bridge`]: session bridge to Client
//! - [`Driver`]: input, transport and output for one front-end
//!
//! Every input (user intent, transport event, tick) is handled to
//! completion before the next one is read, so session state is only ever
//! touched by one handler at a time.

use std::{ops::Sub, time::Duration};

use roomchat_client::ClientConfig;
use roomchat_core::{Environment, RoomCatalog};

use crate::{App, AppAction, AppEvent, Bridge, Driver, TransportCommand};

/// Most transport events handled in one cycle, so a flooding server cannot
/// starve input and ticks.
const MAX_EVENTS_PER_CYCLE: usize = 256;

/// Single-actor loop over one App, one Bridge and one Driver.
///
/// # Type Parameters
///
/// - `D`: front-end I/O
/// - `E`: Environment for time and randomness
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    app: App,
    bridge: Bridge<E>,
    server_addr: String,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
    D::Instant: Sub<Output = Duration>,
{
    /// Create a new runtime with the standard room catalog.
    pub fn new(driver: D, env: E, config: ClientConfig, server_addr: String) -> Self {
        Self::with_catalog(driver, env, config, server_addr, RoomCatalog::standard())
    }

    /// Create a new runtime with a custom room catalog.
    pub fn with_catalog(
        driver: D,
        env: E,
        config: ClientConfig,
        server_addr: String,
        catalog: RoomCatalog,
    ) -> Self {
        let app = App::with_catalog(server_addr.clone(), catalog.clone());
        let bridge = Bridge::with_catalog(env, config, catalog);
        Self { driver, app, bridge, server_addr }
    }

    /// Connect, then loop until the user quits. Each cycle reads at most
    /// one input, then every transport event already waiting (up to
    /// `MAX_EVENTS_PER_CYCLE`), then ticks the session so timeouts and
    /// reconnects fire. Transport commands queued by any of
    /// those run before the cycle ends.
    ///
    /// On quit the session leaves its room and closes the transport before
    /// the driver is stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to render.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;
        let actions = self.app.connect();
        let mut should_quit = self.process_actions(actions).await?;

        while !should_quit {
            should_quit = self.process_cycle().await?;
        }

        let events = self.bridge.shutdown();
        self.process_bridge_events(events).await?;
        self.driver.stop();
        Ok(())
    }

    /// One loop cycle. `true` once the user quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        let actions = self.driver.poll_event(&mut self.app).await?;
        if !actions.is_empty() && self.process_actions(actions).await? {
            return Ok(true);
        }

        let mut received = 0;
        while received < MAX_EVENTS_PER_CYCLE
            && self.driver.is_connected()
            && let Some(event) = self.driver.recv().await
        {
            received += 1;
            let events = self.bridge.handle_transport(event);
            if self.process_bridge_events(events).await? {
                return Ok(true);
            }
        }
        if received == MAX_EVENTS_PER_CYCLE {
            tracing::debug!(received, "transport backlog left for the next cycle");
        }

        let now = self.driver.now();
        let events = self.bridge.handle_tick(now);
        self.process_bridge_events(events).await
    }

    /// Run App actions, and the actions their results produce. `true` on
    /// quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),

                    // Session operations go through the bridge
                    AppAction::Connect
                    | AppAction::JoinRoom { .. }
                    | AppAction::SendMessage { .. }
                    | AppAction::LeaveRoom => {
                        let mut events = self.bridge.process_app_action(action);
                        events.extend(self.execute_commands().await);
                        for event in events {
                            pending_actions.extend(self.app.handle(event));
                        }
                    },
                }
            }
        }
        Ok(false)
    }

    /// Feed session events to the App. `true` on quit.
    async fn process_bridge_events(&mut self, mut events: Vec<AppEvent>) -> Result<bool, D::Error> {
        events.extend(self.execute_commands().await);
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Execute queued transport commands until the bridge has none left.
    ///
    /// Connect and send failures are fed back as transport faults, which
    /// may queue further commands (a scheduled reconnect never does, since
    /// it waits for a tick).
    async fn execute_commands(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();

        loop {
            let commands = self.bridge.take_commands();
            if commands.is_empty() {
                return events;
            }

            for command in commands {
                match command {
                    TransportCommand::Connect { attempt } => {
                        tracing::debug!(attempt, addr = %self.server_addr, "opening transport");
                        match self.driver.connect(&self.server_addr).await {
                            Ok(()) => events.extend(self.bridge.handle_connected()),
                            Err(e) => events.extend(self.bridge.handle_fault(e.to_string())),
                        }
                    },
                    TransportCommand::Send(message) => {
                        if let Err(e) = self.driver.send(message).await {
                            tracing::warn!(error = %e, "send failed");
                            events.extend(self.bridge.handle_fault(e.to_string()));
                        }
                    },
                    TransportCommand::Close { reason } => {
                        tracing::debug!(%reason, "closing transport");
                        self.driver.disconnect().await;
                    },
                }
            }
        }
    }

    /// View state.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Mutable view state, for front-ends that edit status lines.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Session bridge.
    pub fn bridge(&self) -> &Bridge<E> {
        &self.bridge
    }
}
