//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::collections::{BTreeMap, BTreeSet};

use roomchat_app::App;
use roomchat_client::Client;
use roomchat_core::{ConnectionState, Environment, Message};
use serde::Serialize;

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more clients and, when the test
/// owns it, the server.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
    /// Server state. `None` if the server is not observable.
    pub server: Option<ServerSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client], server: None }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<ClientSnapshot>) -> Self {
        Self { clients, server: None }
    }

    /// Attach server state.
    #[must_use]
    pub fn with_server(mut self, server: ServerSnapshot) -> Self {
        self.server = Some(server);
        self
    }

    /// Add a client snapshot.
    pub fn add_client(&mut self, client: ClientSnapshot) {
        self.clients.push(client);
    }
}

/// Snapshot of a single client's observable state: the App's view next to
/// the session client's ground truth.
#[derive(Debug, Clone)]
pub struct ClientSnapshot {
    /// Client identifier.
    pub id: u64,
    /// Connection state as the session client sees it.
    pub connection: ConnectionState,
    /// Connection state as the App shows it.
    pub app_connection: ConnectionState,
    /// Joined room according to the session client.
    pub room: Option<String>,
    /// Joined room as the App shows it.
    pub app_room: Option<String>,
    /// Identity according to the session client.
    pub identity: Option<String>,
    /// Identity as the App shows it.
    pub app_identity: Option<String>,
    /// Session client log.
    pub log: Vec<Message>,
    /// Whether the session client log is stale.
    pub log_stale: bool,
    /// App log mirror.
    pub app_log: Vec<Message>,
    /// Whether the App shows the log as stale.
    pub app_log_stale: bool,
    /// Undismissed notifications in the App.
    pub notifications: usize,
}

impl ClientSnapshot {
    /// Capture an App and the session client behind it.
    pub fn capture<E: Environment>(id: u64, app: &App, client: &Client<E>) -> Self {
        let session = client.session();
        Self {
            id,
            connection: session.connection_state,
            app_connection: app.connection_state(),
            room: session.current_room.map(|r| r.to_string()),
            app_room: app.current_room().map(ToString::to_string),
            identity: session.identity,
            app_identity: app.identity().map(str::to_string),
            log: client.log().entries().to_vec(),
            log_stale: client.log().is_stale(),
            app_log: app.messages().to_vec(),
            app_log_stale: app.log().stale,
            notifications: app.notification_count(),
        }
    }

    /// Bodies of user messages in the session log, in order.
    pub fn user_bodies(&self) -> Vec<&str> {
        self.log.iter().filter(|m| m.author.is_some()).map(|m| m.body.as_str()).collect()
    }
}

/// Snapshot of the server's membership table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerSnapshot {
    /// Room id to member usernames.
    pub rooms: BTreeMap<String, BTreeSet<String>>,
}

impl ServerSnapshot {
    /// Whether `username` is a member of `room`.
    pub fn is_member(&self, room: &str, username: &str) -> bool {
        self.rooms.get(room).is_some_and(|members| members.contains(username))
    }
}
