//! Command parsing for input lines.
//!
//! Lines starting with `/` are commands; anything else is a message for the
//! joined room. A leading `//` escapes a message that starts with a slash.

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/join <username> <room> [secret]`
    Join {
        /// Display name.
        username: String,
        /// Catalog room id.
        room_id: String,
        /// Everything after the room id, if anything.
        secret: Option<String>,
    },
    /// `/leave`
    Leave,
    /// `/rooms`
    Rooms,
    /// `/dismiss`
    Dismiss,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// Plain text for the joined room.
    Message {
        /// Message body, as typed.
        body: String,
    },
    /// Unrecognized command.
    Unknown {
        /// The command word, without the slash.
        input: String,
    },
    /// Known command with missing arguments.
    InvalidArgs {
        /// Command name.
        command: &'static str,
        /// Expected form.
        usage: &'static str,
    },
}

/// Usage line for `/join`.
pub const JOIN_USAGE: &str = "/join <username> <room> [secret]";

/// One line per command, for `/help`.
pub const HELP: &[&str] = &[
    "/join <username> <room> [secret]  join a room, leaving the current one",
    "/leave                            leave the joined room",
    "/rooms                            list the rooms you can join",
    "/dismiss                          dismiss the oldest notification",
    "/quit                             leave and exit",
    "anything else is sent to the joined room",
];

/// Parse one input line. The caller skips blank lines.
pub fn parse(line: &str) -> Command {
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Message { body: line.to_string() };
    };
    if rest.starts_with('/') {
        return Command::Message { body: rest.to_string() };
    }

    let (name, args) = next_word(rest).unwrap_or(("", ""));
    match name {
        "join" => parse_join(args),
        "leave" => Command::Leave,
        "rooms" => Command::Rooms,
        "dismiss" => Command::Dismiss,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown { input: name.to_string() },
    }
}

fn parse_join(args: &str) -> Command {
    let invalid = Command::InvalidArgs { command: "join", usage: JOIN_USAGE };
    let Some((username, rest)) = next_word(args) else {
        return invalid;
    };
    let Some((room_id, rest)) = next_word(rest) else {
        return invalid;
    };

    // The secret keeps its inner whitespace
    let secret = rest.trim_start();
    Command::Join {
        username: username.to_string(),
        room_id: room_id.to_string(),
        secret: (!secret.is_empty()).then(|| secret.to_string()),
    }
}

/// Split off the first whitespace-delimited word.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    Some(input.split_once(char::is_whitespace).unwrap_or((input, "")))
}
