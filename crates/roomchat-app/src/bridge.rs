//! Session-to-Application translation layer.
//!
//! The [`Bridge`] wraps the sans-IO [`roomchat_client::Client`] and adapts
//! it to the application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts [`crate::AppAction`] into client events.
//! - Accumulates [`TransportCommand`]s to be executed by the driver in the
//!   next I/O cycle.
//! - Interprets results from the client and converts them back into
//!   [`crate::AppEvent`]s to update the view.
//! - Manages time ticks generically to support both real-time execution and
//!   deterministic simulation.

use roomchat_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, TransportEvent,
};
use roomchat_core::{Environment, RoomCatalog};
use roomchat_proto::ClientMessage;

use crate::{AppAction, AppEvent};

/// Transport work for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Open a fresh transport, replacing any previous one.
    Connect {
        /// Reconnect attempt, 0 for the initial connect.
        attempt: u32,
    },

    /// Write a message to the live transport.
    Send(ClientMessage),

    /// Drop the live transport.
    Close {
        /// Reason for closing.
        reason: String,
    },
}

/// Bridge between App and Client session logic.
///
/// Generic over Environment to support both production and simulation.
/// The Instant type is determined by the Environment's associated type.
pub struct Bridge<E: Environment> {
    client: Client<E>,
    commands: Vec<TransportCommand>,
    /// Whether the App has been told the log is stale.
    log_stale: bool,
}

impl<E: Environment> Bridge<E> {
    /// Create a new Bridge with the standard room catalog.
    pub fn new(env: E, config: ClientConfig) -> Self {
        Self::with_catalog(env, config, RoomCatalog::standard())
    }

    /// Create a new Bridge with a custom room catalog.
    pub fn with_catalog(env: E, config: ClientConfig, catalog: RoomCatalog) -> Self {
        let client = Client::with_catalog(env, config, catalog);
        Self { client, commands: Vec::new(), log_stale: false }
    }

    /// Underlying session client.
    pub fn client(&self) -> &Client<E> {
        &self.client
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        let event = match action {
            AppAction::Connect => ClientEvent::Open,
            AppAction::JoinRoom { username, room_id, secret } => {
                ClientEvent::JoinRoom { username, room_id, secret }
            },
            AppAction::SendMessage { body } => ClientEvent::SendMessage { body },
            AppAction::LeaveRoom => ClientEvent::LeaveRoom,
            AppAction::Render | AppAction::Quit => return vec![],
        };
        let result = self.client.handle(event);
        self.handle_client_result(result)
    }

    /// The transport requested by the last `Connect` command is up.
    pub fn handle_connected(&mut self) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::TransportConnected);
        self.handle_client_result(result)
    }

    /// The transport could not be opened or failed while in use.
    pub fn handle_fault(&mut self, reason: String) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::TransportFault { reason });
        self.handle_client_result(result)
    }

    /// Handle an event from the live transport.
    pub fn handle_transport(&mut self, event: TransportEvent) -> Vec<AppEvent> {
        let event = match event {
            TransportEvent::Message(message) => ClientEvent::Inbound(message),
            TransportEvent::Disconnected { reason } => {
                ClientEvent::TransportDisconnected { reason }
            },
        };
        let result = self.client.handle(event);
        self.handle_client_result(result)
    }

    /// Process a time tick.
    pub fn handle_tick(&mut self, now: E::Instant) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::Tick { now });
        self.handle_client_result(result)
    }

    /// Close the session: leave the room and drop the transport.
    pub fn shutdown(&mut self) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::Close);
        self.handle_client_result(result)
    }

    /// Take pending transport commands.
    pub fn take_commands(&mut self) -> Vec<TransportCommand> {
        std::mem::take(&mut self.commands)
    }

    fn handle_client_result(
        &mut self,
        result: Result<Vec<ClientAction>, ClientError>,
    ) -> Vec<AppEvent> {
        let mut events = match result {
            Ok(actions) => self.process_client_actions(actions),
            Err(e) => {
                tracing::debug!(error = %e, "intent rejected");
                vec![AppEvent::Error(e)]
            },
        };

        // A reset in this batch clears the App's flag, so report again
        let stale = self.client.log().is_stale();
        let reset = events.iter().any(|e| matches!(e, AppEvent::LogCleared { .. }));
        if stale && (!self.log_stale || reset) {
            events.push(AppEvent::LogStale);
        }
        self.log_stale = stale;
        events
    }

    fn process_client_actions(&mut self, actions: Vec<ClientAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                ClientAction::Connect { attempt } => {
                    self.commands.push(TransportCommand::Connect { attempt });
                },
                ClientAction::CloseTransport { reason } => {
                    self.commands.push(TransportCommand::Close { reason });
                },
                ClientAction::Send(message) => {
                    self.commands.push(TransportCommand::Send(message));
                },
                ClientAction::ConnectionChanged(state) => {
                    events.push(AppEvent::ConnectionChanged(state));
                },
                ClientAction::LogCleared { room } => {
                    events.push(AppEvent::LogCleared { room });
                },
                ClientAction::Deliver(message) => {
                    events.push(AppEvent::MessageDelivered(message));
                },
                ClientAction::Joined { room, username } => {
                    events.push(AppEvent::Joined { room, username });
                },
                ClientAction::Left { room } => {
                    events.push(AppEvent::Left { room });
                },
                ClientAction::Notify(error) => {
                    events.push(AppEvent::Error(error));
                },
            }
        }

        events
    }
}
