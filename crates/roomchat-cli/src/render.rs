//! Line rendering.
//!
//! The terminal has no layout: each render prints whatever changed in the
//! [`App`] since the previous one, as plain lines appended to the output.

use roomchat_app::{App, ConnectionState};
use roomchat_core::{Message, MessageKind, RoomId};

/// Remembers what has been printed so far.
#[derive(Debug, Default)]
pub struct Screen {
    state: Option<ConnectionState>,
    joining: Option<RoomId>,
    membership: Option<(RoomId, String)>,
    log_generation: u64,
    printed: usize,
    stale: bool,
    last_notification: u64,
}

impl Screen {
    /// Nothing printed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines describing what changed since the last call.
    pub fn update(&mut self, app: &App) -> Vec<String> {
        let mut lines = Vec::new();
        self.connection_lines(app, &mut lines);
        self.log_lines(app, &mut lines);
        self.membership_lines(app, &mut lines);

        let last_notification = self.last_notification;
        for notification in app.notifications().filter(|n| n.seq > last_notification) {
            let hint = if notification.transient { " (may succeed if retried)" } else { "" };
            lines.push(format!("! {}{hint}", notification.message));
            self.last_notification = notification.seq;
        }

        lines
    }

    fn connection_lines(&mut self, app: &App, lines: &mut Vec<String>) {
        let state = app.connection_state();
        if self.state == Some(state) {
            return;
        }
        // Nothing worth saying before the first connect
        if self.state.is_some() || state != ConnectionState::Disconnected {
            lines.push(match state {
                ConnectionState::Connecting => format!("-- connecting to {}", app.server_addr()),
                ConnectionState::Connected => "-- connected".to_string(),
                ConnectionState::Disconnected => "-- disconnected".to_string(),
            });
        }
        self.state = Some(state);
    }

    fn log_lines(&mut self, app: &App, lines: &mut Vec<String>) {
        let log = app.log();
        if log.generation != self.log_generation {
            self.log_generation = log.generation;
            self.printed = 0;
            self.stale = false;
        }

        for message in log.entries.iter().skip(self.printed) {
            lines.push(format_message(message));
        }
        self.printed = log.entries.len();

        if log.stale && !self.stale {
            lines.push("-- history paused until the room is joined again".to_string());
        }
        self.stale = log.stale;
    }

    fn membership_lines(&mut self, app: &App, lines: &mut Vec<String>) {
        let joining = app.joining().cloned();
        if joining != self.joining {
            if let Some(room) = &joining {
                lines.push(format!("-- joining {room}"));
            }
            self.joining = joining;
        }

        let membership = app
            .current_room()
            .cloned()
            .zip(app.identity().map(str::to_string));
        if membership == self.membership {
            return;
        }
        match (&self.membership, &membership) {
            (_, Some((room, username))) => lines.push(format!("-- joined {room} as {username}")),
            // A dropped connection already said why
            (Some((room, _)), None) if app.connection_state() == ConnectionState::Connected => {
                lines.push(format!("-- left {room}"));
            },
            _ => {},
        }
        self.membership = membership;
    }
}

/// One log entry as a line.
pub fn format_message(message: &Message) -> String {
    let time = message.occurred_at.format("%H:%M:%S");
    match (message.kind, &message.author) {
        (MessageKind::UserMessage, Some(author)) => format!("[{time}] <{author}> {}", message.body),
        _ => format!("[{time}] * {}", message.body),
    }
}
