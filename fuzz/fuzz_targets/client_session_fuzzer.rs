//! Fuzz target for the session client
//!
//! # Strategy
//!
//! - User intents with names and rooms drawn from small pools, so joins hit
//!   both valid and invalid input
//! - Server events with matching and mismatching request ids and usernames
//! - Transport drops, faults and ticks with arbitrary time jumps
//!
//! # Invariants
//!
//! - A rejected intent emits nothing
//! - Room and identity are only set while Connected
//! - Outbound messages are only emitted around a Connected state
//! - `join_room` for the protected room always carries a secret
//! - The log only grows by `Deliver` actions and only resets on `LogCleared`

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use chrono::DateTime;
use libfuzzer_sys::fuzz_target;
use roomchat_client::{Client, ClientAction, ClientConfig, ClientEvent, ConnectionState};
use roomchat_core::{env::test_utils::MockEnv, Environment};
use roomchat_proto::{ClientMessage, Presence, ReceiveMessage, RoomJoined, ServerMessage};

const USERS: [&str; 4] = ["alice", "bob", "  ", ""];
const ROOMS: [&str; 4] = ["general", "music", "admin", "lobby"];
const SECRETS: [Option<&str>; 3] = [None, Some("opensesame"), Some(" ")];

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Open,
    Connected,
    Dropped,
    Fault,
    Close,
    Join { user: u8, room: u8, secret: u8 },
    Send { body: String },
    Leave,
    Ack { room: u8, user: u8, request_offset: u8 },
    Presence { user: u8, joined: bool },
    Receive { author: u8, body: String },
    ServerError,
    Advance { millis: u16 },
}

fn pick<T: Copy>(pool: &[T], index: u8) -> T {
    pool[usize::from(index) % pool.len()]
}

fuzz_target!(|ops: Vec<Op>| {
    let env = MockEnv::new();
    let mut client = Client::new(env.clone(), ClientConfig::default());
    let stamp = DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default();

    for op in ops.into_iter().take(256) {
        let event = match op {
            Op::Open => ClientEvent::Open,
            Op::Connected => ClientEvent::TransportConnected,
            Op::Dropped => ClientEvent::TransportDisconnected { reason: "dropped".into() },
            Op::Fault => ClientEvent::TransportFault { reason: "reset".into() },
            Op::Close => ClientEvent::Close,
            Op::Join { user, room, secret } => ClientEvent::JoinRoom {
                username: pick(&USERS, user).into(),
                room_id: pick(&ROOMS, room).into(),
                secret: pick(&SECRETS, secret).map(Into::into),
            },
            Op::Send { body } => ClientEvent::SendMessage { body },
            Op::Leave => ClientEvent::LeaveRoom,
            Op::Ack { room, user, request_offset } => {
                let request_id = client.join_seq().saturating_sub(u64::from(request_offset % 3));
                ClientEvent::Inbound(ServerMessage::RoomJoined(RoomJoined {
                    room: pick(&ROOMS, room).into(),
                    username: pick(&USERS, user).into(),
                    request_id: Some(request_id),
                }))
            },
            Op::Presence { user, joined } => {
                let presence = Presence { username: pick(&USERS, user).into(), timestamp: stamp };
                ClientEvent::Inbound(if joined {
                    ServerMessage::UserJoined(presence)
                } else {
                    ServerMessage::UserLeft(presence)
                })
            },
            Op::Receive { author, body } => {
                ClientEvent::Inbound(ServerMessage::ReceiveMessage(ReceiveMessage {
                    author: pick(&USERS, author).into(),
                    message: body,
                    timestamp: stamp,
                }))
            },
            Op::ServerError => ClientEvent::Inbound(ServerMessage::Error("nope".into())),
            Op::Advance { millis } => {
                env.advance(Duration::from_millis(u64::from(millis) * 10));
                ClientEvent::Tick { now: env.now() }
            },
        };

        let log_before = client.log().len();
        let was_connected = client.connection_state() == ConnectionState::Connected;
        let Ok(actions) = client.handle(event) else {
            assert_eq!(client.log().len(), log_before);
            continue;
        };

        let mut expected_len = log_before;
        for action in &actions {
            match action {
                ClientAction::LogCleared { .. } => expected_len = 0,
                ClientAction::Deliver(_) => expected_len += 1,
                ClientAction::Send(ClientMessage::JoinRoom(join)) if join.room == "admin" => {
                    assert!(join.password.as_deref().is_some_and(|s| !s.trim().is_empty()));
                },
                _ => {},
            }
        }
        assert_eq!(client.log().len(), expected_len);

        // A leave may go out on the way down, so either side of the event counts
        if actions.iter().any(|a| matches!(a, ClientAction::Send(_))) {
            let connected_now = client.connection_state() == ConnectionState::Connected;
            assert!(was_connected || connected_now);
        }

        let session = client.session();
        if session.current_room.is_some() || session.identity.is_some() {
            assert_eq!(session.connection_state, ConnectionState::Connected);
        }
    }
});
