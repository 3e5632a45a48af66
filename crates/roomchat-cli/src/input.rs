//! Line input handling.
//!
//! Turns a typed line into App intents. Commands that only show local
//! information (`/rooms`, `/help`, usage errors) produce output lines
//! instead of going through the session.

use roomchat_app::{App, AppAction};

use crate::commands::{self, Command};

/// What a line produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineOutcome {
    /// Actions for the runtime.
    pub actions: Vec<AppAction>,
    /// Lines to print right away.
    pub output: Vec<String>,
}

impl LineOutcome {
    fn actions(actions: Vec<AppAction>) -> Self {
        Self { actions, output: Vec::new() }
    }

    fn print(output: Vec<String>) -> Self {
        Self { actions: Vec::new(), output }
    }
}

/// Handle one line of user input.
pub fn handle_line(line: &str, app: &mut App) -> LineOutcome {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return LineOutcome::default();
    }

    match commands::parse(line) {
        Command::Join { username, room_id, secret } => {
            LineOutcome::actions(app.join_room(username, room_id, secret))
        },
        Command::Leave => LineOutcome::actions(app.leave_room()),
        Command::Dismiss => LineOutcome::actions(app.dismiss_notification()),
        Command::Quit => LineOutcome::actions(app.quit()),
        Command::Message { body } => LineOutcome::actions(app.send_message(body)),
        Command::Rooms => LineOutcome::print(
            app.catalog()
                .iter()
                .map(|room| {
                    let lock = if room.requires_secret { " (secret)" } else { "" };
                    format!("{:<10} {}{lock}", room.id.as_str(), room.display_name)
                })
                .collect(),
        ),
        Command::Help => {
            LineOutcome::print(commands::HELP.iter().map(|line| (*line).to_string()).collect())
        },
        Command::Unknown { input } => {
            LineOutcome::print(vec![format!("unknown command: /{input} (try /help)")])
        },
        Command::InvalidArgs { command, usage } => {
            LineOutcome::print(vec![format!("/{command}: usage: {usage}")])
        },
    }
}

#[cfg(test)]
mod tests {
    use roomchat_app::AppEvent;
    use roomchat_client::ClientError;

    use super::*;

    fn app() -> App {
        App::new("ws://localhost:4000/ws".into())
    }

    #[test]
    fn blank_lines_do_nothing() {
        let mut app = app();
        assert_eq!(handle_line("   \n", &mut app), LineOutcome::default());
    }

    #[test]
    fn join_goes_through_app() {
        let mut app = app();
        let outcome = handle_line("/join carol admin opensesame\n", &mut app);

        assert_eq!(outcome.actions, vec![AppAction::JoinRoom {
            username: "carol".into(),
            room_id: "admin".into(),
            secret: Some("opensesame".into()),
        }]);
        assert!(outcome.output.is_empty());
    }

    #[test]
    fn text_is_sent() {
        let mut app = app();
        let outcome = handle_line("hello\r\n", &mut app);
        assert_eq!(outcome.actions, vec![AppAction::SendMessage { body: "hello".into() }]);
    }

    #[test]
    fn dismiss_pops_notification() {
        let mut app = app();
        app.handle(AppEvent::Error(ClientError::NotConnected));

        let outcome = handle_line("/dismiss", &mut app);
        assert_eq!(outcome.actions, vec![AppAction::Render]);
        assert_eq!(app.notification_count(), 0);
    }

    #[test]
    fn rooms_lists_catalog() {
        let mut app = app();
        let outcome = handle_line("/rooms", &mut app);

        assert!(outcome.actions.is_empty());
        insta::assert_snapshot!(outcome.output.join("\n"), @r"
        general    General
        gaming     Gaming
        music      Music
        coding     Coding
        tech       Tech
        politics   Politics
        admin      Admin (secret)
        ");
    }

    #[test]
    fn usage_errors_are_printed() {
        let mut app = app();

        let outcome = handle_line("/join alice", &mut app);
        assert_eq!(outcome.output, vec![
            "/join: usage: /join <username> <room> [secret]".to_string()
        ]);

        let outcome = handle_line("/nick bob", &mut app);
        assert_eq!(outcome.output, vec!["unknown command: /nick (try /help)".to_string()]);
    }
}
