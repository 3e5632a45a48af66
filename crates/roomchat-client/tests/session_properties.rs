//! Session client behavior tests.
//!
//! These tests verify the session contract end to end against the action
//! stream:
//! - Log order is receipt order, and every join clears the log
//! - Sends are rejected locally when not joined or empty
//! - Stale join acknowledgements never mark the session joined
//! - Disconnects clear membership from any state
//! - Join retry, send timeout, reconnect backoff and resume

use std::time::Duration;

use chrono::DateTime;
use proptest::prelude::*;
use roomchat_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, ConnectionState, Environment,
    MessageKind, RoomId, SendFailure, ValidationError,
};
use roomchat_core::{ConnectionConfig, ReconnectPolicy, env::test_utils::MockEnv};
use roomchat_proto::{
    ClientMessage, JoinRoom, Presence, ReceiveMessage, RoomJoined, SendMessage, ServerMessage,
};

fn client_with(config: ClientConfig) -> (MockEnv, Client<MockEnv>) {
    let env = MockEnv::new();
    let mut client = Client::new(env.clone(), config);
    client.handle(ClientEvent::Open).unwrap();
    client.handle(ClientEvent::TransportConnected).unwrap();
    (env, client)
}

fn connected() -> (MockEnv, Client<MockEnv>) {
    client_with(ClientConfig::default())
}

fn join_event(username: &str, room: &str, secret: Option<&str>) -> ClientEvent {
    ClientEvent::JoinRoom {
        username: username.into(),
        room_id: room.into(),
        secret: secret.map(Into::into),
    }
}

fn ack(room: &str, username: &str, request_id: u64) -> ClientEvent {
    ClientEvent::Inbound(ServerMessage::RoomJoined(RoomJoined {
        room: room.into(),
        username: username.into(),
        request_id: Some(request_id),
    }))
}

fn chat(author: &str, message: &str, millis: i64) -> ClientEvent {
    ClientEvent::Inbound(ServerMessage::ReceiveMessage(ReceiveMessage {
        author: author.into(),
        message: message.into(),
        timestamp: DateTime::from_timestamp_millis(millis).unwrap(),
    }))
}

fn user_joined(username: &str) -> ClientEvent {
    ClientEvent::Inbound(ServerMessage::UserJoined(Presence {
        username: username.into(),
        timestamp: DateTime::from_timestamp_millis(0).unwrap(),
    }))
}

fn joined(username: &str, room: &str) -> (MockEnv, Client<MockEnv>) {
    let (env, mut client) = connected();
    client.handle(join_event(username, room, None)).unwrap();
    let seq = client.join_seq();
    client.handle(ack(room, username, seq)).unwrap();
    assert!(client.is_joined());
    (env, client)
}

fn sent(actions: &[ClientAction]) -> Vec<&ClientMessage> {
    actions
        .iter()
        .filter_map(|action| match action {
            ClientAction::Send(message) => Some(message),
            _ => None,
        })
        .collect()
}

fn tick(env: &MockEnv, client: &mut Client<MockEnv>, by: Duration) -> Vec<ClientAction> {
    env.advance(by);
    client.handle(ClientEvent::Tick { now: env.now() }).unwrap()
}

/// End-to-end happy path: join, own presence, send, echo.
#[test]
fn join_presence_send_echo() {
    let (_env, mut client) = connected();

    client.handle(join_event("alice", "general", None)).unwrap();

    // Server without room_joined: own presence acknowledges the join
    let actions = client.handle(user_joined("alice")).unwrap();
    assert!(matches!(&actions[0], ClientAction::Joined { room, username }
        if room == "general" && username == "alice"));
    assert_eq!(client.log().len(), 1);
    assert_eq!(client.log().entries()[0].body, "alice joined");
    assert_eq!(client.log().entries()[0].kind, MessageKind::Presence);

    let actions = client.handle(ClientEvent::SendMessage { body: "hi".into() }).unwrap();
    assert_eq!(sent(&actions), vec![&ClientMessage::SendMessage(SendMessage {
        message: "hi".into(),
        room: "general".into(),
    })]);
    assert_eq!(client.log().len(), 1, "sends are never appended locally");

    client.handle(chat("alice", "hi", 1_000)).unwrap();
    let entries = client.log().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].author.as_deref(), Some("alice"));
    assert_eq!(entries[1].kind, MessageKind::UserMessage);
    assert_eq!(client.pending_send_count(), 0);
}

#[test]
fn rejoin_same_room_clears_log() {
    let (_env, mut client) = joined("alice", "general");
    client.handle(chat("bob", "one", 0)).unwrap();
    assert_eq!(client.log().len(), 1);

    let actions = client.handle(join_event("alice", "general", None)).unwrap();
    assert!(actions.contains(&ClientAction::LogCleared { room: RoomId::new("general") }));
    assert!(client.log().is_empty());
}

#[test]
fn send_rejected_when_not_joined() {
    let (_env, mut client) = connected();
    let result = client.handle(ClientEvent::SendMessage { body: "hi".into() });
    assert_eq!(result, Err(ClientError::SendRejected(SendFailure::NotJoined)));
}

#[test]
fn send_rejected_when_blank() {
    let (_env, mut client) = joined("alice", "general");
    let result = client.handle(ClientEvent::SendMessage { body: " \t\n".into() });
    assert_eq!(result, Err(ClientError::Validation(ValidationError::EmptyMessage)));
    assert_eq!(client.pending_send_count(), 0);
}

#[test]
fn protected_room_requires_secret() {
    let (_env, mut client) = connected();

    for secret in [None, Some(""), Some("   ")] {
        let result = client.handle(join_event("bob", "admin", secret));
        assert_eq!(
            result,
            Err(ClientError::Validation(ValidationError::MissingSecret { room: "admin".into() }))
        );
    }

    // Nothing was emitted, so even a permissive server cannot join us
    client.handle(ack("admin", "bob", 1)).unwrap();
    assert!(!client.is_joined());
    assert_eq!(client.join_seq(), 0);
}

#[test]
fn protected_room_sends_secret_verbatim() {
    let (_env, mut client) = connected();
    let actions = client.handle(join_event("bob", "admin", Some(" s3cret "))).unwrap();

    assert_eq!(sent(&actions), vec![&ClientMessage::JoinRoom(JoinRoom {
        room: "admin".into(),
        username: "bob".into(),
        password: Some(" s3cret ".into()),
        request_id: Some(1),
    })]);
}

#[test]
fn validation_errors() {
    let (_env, mut client) = connected();

    assert_eq!(
        client.handle(join_event("   ", "general", None)),
        Err(ClientError::Validation(ValidationError::EmptyUsername))
    );
    assert_eq!(
        client.handle(join_event("alice", "lobby", None)),
        Err(ClientError::Validation(ValidationError::UnknownRoom { room: "lobby".into() }))
    );
}

#[test]
fn stale_ack_is_ignored() {
    let (_env, mut client) = connected();
    client.handle(join_event("alice", "general", None)).unwrap();
    client.handle(join_event("alice", "music", None)).unwrap();
    assert_eq!(client.join_seq(), 2);

    // Reply to the first attempt
    assert!(client.handle(ack("general", "alice", 1)).unwrap().is_empty());
    assert!(!client.is_joined());

    // Right seq, wrong room
    assert!(client.handle(ack("general", "alice", 2)).unwrap().is_empty());
    assert!(!client.is_joined());

    client.handle(ack("music", "alice", 2)).unwrap();
    assert_eq!(client.session().current_room, Some(RoomId::new("music")));
}

#[test]
fn ack_after_disconnect_is_ignored() {
    let (_env, mut client) = connected();
    client.handle(join_event("alice", "general", None)).unwrap();
    client.handle(ClientEvent::TransportDisconnected { reason: "reset".into() }).unwrap();

    assert!(client.handle(ack("general", "alice", 1)).unwrap().is_empty());
    assert!(!client.is_joined());
}

#[test]
fn disconnect_clears_membership_and_marks_log_stale() {
    let (_env, mut client) = joined("alice", "general");
    client.handle(chat("bob", "before", 0)).unwrap();
    client.handle(ClientEvent::SendMessage { body: "unechoed".into() }).unwrap();

    let actions =
        client.handle(ClientEvent::TransportDisconnected { reason: "reset".into() }).unwrap();

    assert!(actions.contains(&ClientAction::ConnectionChanged(ConnectionState::Disconnected)));
    assert!(actions.contains(&ClientAction::Notify(ClientError::SendRejected(
        SendFailure::Disconnected
    ))));

    let session = client.session();
    assert_eq!(session.connection_state, ConnectionState::Disconnected);
    assert_eq!(session.current_room, None);
    assert_eq!(session.identity, None);

    assert!(client.log().is_stale());
    assert_eq!(client.log().len(), 1, "log retained for display");

    client.handle(chat("bob", "after", 1)).unwrap();
    assert_eq!(client.log().len(), 1);

    let result = client.handle(ClientEvent::SendMessage { body: "hi".into() });
    assert_eq!(result, Err(ClientError::SendRejected(SendFailure::NotJoined)));
}

#[test]
fn fault_discards_transport() {
    let (_env, mut client) = joined("alice", "general");
    let actions = client.handle(ClientEvent::TransportFault { reason: "tls".into() }).unwrap();
    assert_eq!(actions[0], ClientAction::CloseTransport { reason: "tls".into() });
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
}

#[test]
fn server_error_during_join_is_join_rejected() {
    let (_env, mut client) = connected();
    client.handle(join_event("bob", "admin", Some("wrong"))).unwrap();

    let rejection = ServerMessage::Error("Invalid password".into());
    let actions = client.handle(ClientEvent::Inbound(rejection)).unwrap();

    assert_eq!(actions, vec![ClientAction::Notify(ClientError::JoinRejected {
        room: "admin".into(),
        reason: "Invalid password".into(),
    })]);
    assert!(!client.is_joined());
    assert_eq!(client.connection_state(), ConnectionState::Connected);

    // User can retry with corrected input
    client.handle(join_event("bob", "admin", Some("right"))).unwrap();
    client.handle(ack("admin", "bob", 2)).unwrap();
    assert!(client.is_joined());
}

#[test]
fn server_error_with_pending_send_is_send_rejected() {
    let (_env, mut client) = joined("alice", "general");
    client.handle(ClientEvent::SendMessage { body: "hi".into() }).unwrap();

    let actions =
        client.handle(ClientEvent::Inbound(ServerMessage::Error("rate limited".into()))).unwrap();
    assert_eq!(actions, vec![ClientAction::Notify(ClientError::SendRejected(
        SendFailure::Server("rate limited".into())
    ))]);
    assert!(client.is_joined());
}

#[test]
fn join_retries_with_same_seq_then_rejects() {
    let config = ClientConfig { max_join_retries: 2, ..ClientConfig::default() };
    let (env, mut client) = client_with(config.clone());
    client.handle(join_event("alice", "general", None)).unwrap();

    for _ in 0..2 {
        let actions = tick(&env, &mut client, config.join_timeout);
        assert_eq!(sent(&actions), vec![&ClientMessage::JoinRoom(JoinRoom {
            room: "general".into(),
            username: "alice".into(),
            password: None,
            request_id: Some(1),
        })]);
    }

    let actions = tick(&env, &mut client, config.join_timeout);
    assert!(matches!(
        &actions[..],
        [ClientAction::Notify(ClientError::JoinRejected { room, .. })] if room == "general"
    ));
    assert_eq!(client.pending_join_room(), None);
    assert_eq!(client.join_seq(), 1);
}

#[test]
fn unechoed_send_times_out_without_retry() {
    let (env, mut client) = joined("alice", "general");
    client.handle(ClientEvent::SendMessage { body: "hi".into() }).unwrap();

    let actions = tick(&env, &mut client, ClientConfig::default().send_timeout);
    assert_eq!(actions, vec![ClientAction::Notify(ClientError::SendRejected(
        SendFailure::Timeout
    ))]);
    assert!(sent(&actions).is_empty());
    assert_eq!(client.pending_send_count(), 0);
}

#[test]
fn reconnect_resumes_last_membership() {
    let (env, mut client) = joined("alice", "tech");
    client.handle(ClientEvent::TransportDisconnected { reason: "reset".into() }).unwrap();

    let actions = tick(&env, &mut client, Duration::from_secs(1));
    assert!(actions.contains(&ClientAction::Connect { attempt: 1 }));

    let actions = client.handle(ClientEvent::TransportConnected).unwrap();
    assert_eq!(sent(&actions), vec![&ClientMessage::JoinRoom(JoinRoom {
        room: "tech".into(),
        username: "alice".into(),
        password: None,
        request_id: Some(2),
    })]);
    assert!(actions.contains(&ClientAction::LogCleared { room: RoomId::new("tech") }));

    client.handle(ack("tech", "alice", 2)).unwrap();
    assert_eq!(client.session().identity.as_deref(), Some("alice"));
}

#[test]
fn no_resume_after_explicit_leave() {
    let (env, mut client) = joined("alice", "tech");
    client.handle(ClientEvent::LeaveRoom).unwrap();
    client.handle(ClientEvent::TransportDisconnected { reason: "reset".into() }).unwrap();

    tick(&env, &mut client, Duration::from_secs(1));
    let actions = client.handle(ClientEvent::TransportConnected).unwrap();
    assert!(sent(&actions).is_empty());
}

#[test]
fn reconnect_gives_up_with_transport_fault() {
    let policy = ReconnectPolicy { max_attempts: 2, ..ReconnectPolicy::default() };
    let config = ClientConfig {
        connection: ConnectionConfig::with_reconnect(policy),
        ..ClientConfig::default()
    };
    let (env, mut client) = client_with(config);

    let mut notified = Vec::new();
    let mut drops = client
        .handle(ClientEvent::TransportDisconnected { reason: "reset".into() })
        .unwrap();
    for _ in 0..4 {
        notified.extend(drops.iter().filter_map(|a| match a {
            ClientAction::Notify(error) => Some(error.clone()),
            _ => None,
        }));
        let actions = tick(&env, &mut client, Duration::from_secs(60));
        drops = if actions.iter().any(|a| matches!(a, ClientAction::Connect { .. })) {
            client.handle(ClientEvent::TransportDisconnected { reason: "refused".into() }).unwrap()
        } else {
            Vec::new()
        };
    }

    assert_eq!(notified, vec![ClientError::TransportFault {
        reason: "gave up after 2 reconnect attempts".into()
    }]);
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
}

#[test]
fn connect_timeout_reports_disconnected() {
    let env = MockEnv::new();
    let mut client = Client::new(env.clone(), ClientConfig::default());
    client.handle(ClientEvent::Open).unwrap();

    let actions = tick(&env, &mut client, Duration::from_secs(11));
    assert!(matches!(&actions[0], ClientAction::CloseTransport { .. }));
    assert!(actions.contains(&ClientAction::ConnectionChanged(ConnectionState::Disconnected)));
}

proptest! {
    /// While joined, the log after N inbound messages is exactly those N
    /// messages in receipt order, whatever their timestamps.
    #[test]
    fn prop_log_is_receipt_order(
        messages in prop::collection::vec(("[a-z]{1,8}", ".{1,32}", any::<i32>()), 0..40),
    ) {
        let (_env, mut client) = joined("alice", "general");

        for (author, body, millis) in &messages {
            client.handle(chat(author, body, i64::from(*millis))).unwrap();
        }

        let entries = client.log().entries();
        prop_assert_eq!(entries.len(), messages.len());
        for (entry, (author, body, _)) in entries.iter().zip(&messages) {
            prop_assert_eq!(entry.author.as_deref(), Some(author.as_str()));
            prop_assert_eq!(&entry.body, body);
        }
    }

    /// Whitespace-only bodies never reach the transport.
    #[test]
    fn prop_blank_send_never_emitted(body in "[ \t\r\n]{0,16}") {
        let (_env, mut client) = joined("alice", "general");
        let result = client.handle(ClientEvent::SendMessage { body });
        prop_assert_eq!(result, Err(ClientError::Validation(ValidationError::EmptyMessage)));
    }

    /// Only the latest join sequence number can complete a join.
    #[test]
    fn prop_only_latest_seq_acknowledges(joins in 1u64..6, reply in 0u64..8) {
        let (_env, mut client) = connected();
        for _ in 0..joins {
            client.handle(join_event("alice", "general", None)).unwrap();
        }

        client.handle(ack("general", "alice", reply)).unwrap();
        prop_assert_eq!(client.is_joined(), reply == joins);
    }
}
