//! Application state machine.
//!
//! This module defines the [`App`] state machine, which holds what the user
//! sees of a chat session, decoupled from I/O and protocol mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Tracks connection status, the joined room and the identity in it.
//! - Mirrors the session message log, including its stale flag.
//! - Queues notifications for rejections and faults without blocking.

use std::collections::VecDeque;

use roomchat_client::ClientError;
use roomchat_core::{Message, RoomCatalog, RoomId};

use crate::{AppAction, AppEvent, ConnectionState, LogView, Notification};

/// Notifications kept before the oldest is dropped.
pub const MAX_NOTIFICATIONS: usize = 32;

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Connection state.
    state: ConnectionState,
    /// Server address for connection.
    server_addr: String,
    /// Rooms the user may join.
    catalog: RoomCatalog,
    /// Acknowledged room. `None` when not joined.
    room: Option<RoomId>,
    /// Identity in `room`.
    identity: Option<String>,
    /// Room of an outstanding join request.
    joining: Option<RoomId>,
    /// Mirror of the session log.
    log: LogView,
    /// Undismissed notifications, oldest first.
    notifications: VecDeque<Notification>,
    /// Sequence number of the last raised notification.
    last_notification: u64,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create a new App with the standard room catalog.
    pub fn new(server_addr: String) -> Self {
        Self::with_catalog(server_addr, RoomCatalog::standard())
    }

    /// Create a new App with a custom room catalog.
    pub fn with_catalog(server_addr: String, catalog: RoomCatalog) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            server_addr,
            catalog,
            room: None,
            identity: None,
            joining: None,
            log: LogView::default(),
            notifications: VecDeque::new(),
            last_notification: 0,
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Tick => vec![],
            AppEvent::ConnectionChanged(state) => {
                self.state = state;
                self.status_message = Some(
                    match state {
                        ConnectionState::Disconnected => "Disconnected",
                        ConnectionState::Connecting => "Connecting...",
                        ConnectionState::Connected => "Connected",
                    }
                    .to_string(),
                );
                if state != ConnectionState::Connected {
                    self.room = None;
                    self.identity = None;
                    self.joining = None;
                }
                vec![AppAction::Render]
            },
            AppEvent::LogCleared { room } => {
                self.log = LogView {
                    room: Some(room.clone()),
                    entries: Vec::new(),
                    stale: false,
                    generation: self.log.generation + 1,
                };
                self.status_message = Some(format!("Joining {room}..."));
                self.joining = Some(room);
                vec![AppAction::Render]
            },
            AppEvent::LogStale => {
                self.log.stale = true;
                vec![AppAction::Render]
            },
            AppEvent::MessageDelivered(message) => {
                self.log.entries.push(message);
                vec![AppAction::Render]
            },
            AppEvent::Joined { room, username } => {
                self.status_message = Some(format!("Joined {room} as {username}"));
                self.joining = None;
                self.room = Some(room);
                self.identity = Some(username);
                vec![AppAction::Render]
            },
            AppEvent::Left { room } => {
                self.status_message = Some(format!("Left {room}"));
                if self.joining.as_ref() == Some(&room) {
                    self.joining = None;
                }
                self.room = None;
                self.identity = None;
                vec![AppAction::Render]
            },
            AppEvent::Error(error) => {
                if let ClientError::JoinRejected { room, .. } = &error
                    && self.joining.as_ref().is_some_and(|r| r.as_str() == room)
                {
                    self.joining = None;
                }
                self.status_message = Some(format!("Error: {error}"));
                self.push_notification(&error);
                vec![AppAction::Render]
            },
        }
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Request connection to the server.
    pub fn connect(&mut self) -> Vec<AppAction> {
        self.status_message = Some(format!("Connecting to {}...", self.server_addr));
        vec![AppAction::Connect, AppAction::Render]
    }

    /// Request to join a room.
    pub fn join_room(
        &self,
        username: impl Into<String>,
        room_id: impl Into<String>,
        secret: Option<String>,
    ) -> Vec<AppAction> {
        vec![AppAction::JoinRoom { username: username.into(), room_id: room_id.into(), secret }]
    }

    /// Request to send a message to the joined room.
    pub fn send_message(&self, body: impl Into<String>) -> Vec<AppAction> {
        vec![AppAction::SendMessage { body: body.into() }]
    }

    /// Request to leave the joined room.
    pub fn leave_room(&self) -> Vec<AppAction> {
        vec![AppAction::LeaveRoom]
    }

    /// Request to quit.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Dismiss the oldest notification.
    pub fn dismiss_notification(&mut self) -> Vec<AppAction> {
        match self.notifications.pop_front() {
            Some(_) => vec![AppAction::Render],
            None => vec![],
        }
    }

    fn push_notification(&mut self, error: &ClientError) {
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.last_notification += 1;
        self.notifications.push_back(Notification {
            seq: self.last_notification,
            message: error.to_string(),
            transient: error.is_transient(),
        });
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Server address.
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Rooms the user may join.
    pub fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    /// Joined room. `None` when not joined.
    pub fn current_room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Identity in the joined room.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Room of an outstanding join request.
    pub fn joining(&self) -> Option<&RoomId> {
        self.joining.as_ref()
    }

    /// Mirrored message log.
    pub fn log(&self) -> &LogView {
        &self.log
    }

    /// Mirrored log entries.
    pub fn messages(&self) -> &[Message] {
        &self.log.entries
    }

    /// Undismissed notifications, oldest first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    /// Number of undismissed notifications.
    pub fn notification_count(&self) -> usize {
        self.notifications.len()
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use roomchat_client::SendFailure;
    use roomchat_core::PresenceChange;

    use super::*;

    fn connected_app() -> App {
        let mut app = App::new("ws://localhost:4000".into());
        app.handle(AppEvent::ConnectionChanged(ConnectionState::Connected));
        app
    }

    fn joined_app(room: &str, username: &str) -> App {
        let mut app = connected_app();
        app.handle(AppEvent::LogCleared { room: RoomId::from(room) });
        app.handle(AppEvent::Joined { room: RoomId::from(room), username: username.into() });
        app
    }

    #[test]
    fn api_connect() {
        let mut app = App::new("ws://localhost:4000".into());
        let actions = app.connect();

        assert!(matches!(actions.as_slice(), [AppAction::Connect, AppAction::Render]));
        assert_eq!(app.status_message(), Some("Connecting to ws://localhost:4000..."));
    }

    #[test]
    fn api_join_room() {
        let app = connected_app();
        let actions = app.join_room("alice", "general", None);

        assert_eq!(
            actions,
            vec![AppAction::JoinRoom {
                username: "alice".into(),
                room_id: "general".into(),
                secret: None
            }]
        );
    }

    #[test]
    fn api_send_and_leave() {
        let app = joined_app("general", "alice");

        assert_eq!(app.send_message("hi"), vec![AppAction::SendMessage { body: "hi".into() }]);
        assert_eq!(app.leave_room(), vec![AppAction::LeaveRoom]);
        assert_eq!(app.quit(), vec![AppAction::Quit]);
    }

    #[test]
    fn joined_sets_room_and_identity() {
        let app = joined_app("general", "alice");

        assert_eq!(app.current_room().map(RoomId::as_str), Some("general"));
        assert_eq!(app.identity(), Some("alice"));
        assert!(app.joining().is_none());
        assert!(!app.log().stale);
    }

    #[test]
    fn log_cleared_discards_entries() {
        let mut app = joined_app("general", "alice");
        app.handle(AppEvent::MessageDelivered(Message::user("alice", "hi", Utc::now())));
        assert_eq!(app.messages().len(), 1);

        app.handle(AppEvent::LogCleared { room: RoomId::from("general") });

        assert!(app.messages().is_empty());
        assert_eq!(app.log().generation, 2);
        assert_eq!(app.joining().map(RoomId::as_str), Some("general"));
    }

    #[test]
    fn disconnect_clears_membership_but_keeps_entries() {
        let mut app = joined_app("general", "alice");
        app.handle(AppEvent::MessageDelivered(Message::presence(
            "bob",
            PresenceChange::Joined,
            Utc::now(),
        )));
        app.handle(AppEvent::LogStale);
        app.handle(AppEvent::ConnectionChanged(ConnectionState::Disconnected));

        assert!(app.current_room().is_none());
        assert!(app.identity().is_none());
        assert_eq!(app.messages().len(), 1);
        assert!(app.log().stale);
        assert_eq!(app.status_message(), Some("Disconnected"));
    }

    #[test]
    fn join_rejection_clears_joining() {
        let mut app = connected_app();
        app.handle(AppEvent::LogCleared { room: RoomId::from("admin") });

        app.handle(AppEvent::Error(ClientError::JoinRejected {
            room: "admin".into(),
            reason: "wrong password".into(),
        }));

        assert!(app.joining().is_none());
        assert_eq!(app.notification_count(), 1);
    }

    #[test]
    fn cancelled_join_clears_joining() {
        let mut app = connected_app();
        app.handle(AppEvent::LogCleared { room: RoomId::from("coding") });

        app.handle(AppEvent::Left { room: RoomId::from("coding") });

        assert!(app.joining().is_none());
        assert!(app.current_room().is_none());
        assert_eq!(app.status_message(), Some("Left coding"));
    }

    #[test]
    fn notifications_are_bounded() {
        let mut app = connected_app();
        for i in 0..MAX_NOTIFICATIONS + 5 {
            app.handle(AppEvent::Error(ClientError::ServerFault { reason: format!("fault {i}") }));
        }

        assert_eq!(app.notification_count(), MAX_NOTIFICATIONS);
        assert_eq!(app.notifications().next().map(|n| n.seq), Some(6));
        let oldest = app.notifications().next().map(|n| n.message.clone());
        assert_eq!(oldest, Some(ClientError::ServerFault { reason: "fault 5".into() }.to_string()));
    }

    #[test]
    fn dismiss_pops_oldest() {
        let mut app = connected_app();
        app.handle(AppEvent::Error(ClientError::SendRejected(SendFailure::Timeout)));
        app.handle(AppEvent::Error(ClientError::NotConnected));

        let actions = app.dismiss_notification();
        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.notification_count(), 1);
        assert!(app.notifications().all(|n| n.transient));

        app.dismiss_notification();
        assert!(app.dismiss_notification().is_empty());
    }
}
