//! Property-based tests for the App state machine.
//!
//! Tests verify that the App's view stays consistent with the session
//! client under arbitrary sequences of intents, server events, transport
//! drops and time.

use std::time::Duration;

use chrono::Utc;
use proptest::prelude::*;
use roomchat_app::{App, AppAction, AppEvent, Bridge, MAX_NOTIFICATIONS, TransportCommand};
use roomchat_client::{ClientConfig, TransportEvent};
use roomchat_core::{ConnectionState, Environment, env::test_utils::MockEnv};
use roomchat_proto::{Presence, ReceiveMessage, RoomJoined, ServerMessage};

const USERS: [&str; 3] = ["alice", "bob", "carol"];
const ROOMS: [&str; 4] = ["general", "music", "admin", "nowhere"];

/// One step of a session.
#[derive(Debug, Clone)]
enum Op {
    Join { user: usize, room: usize, secret: bool },
    Send(String),
    Leave,
    Dismiss,
    Receive { author: usize, body: String },
    PresenceJoined(usize),
    PresenceLeft(usize),
    Ack { stale: bool },
    ServerError,
    Disconnect,
    Tick(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..USERS.len(), 0..ROOMS.len(), any::<bool>())
            .prop_map(|(user, room, secret)| Op::Join { user, room, secret }),
        3 => "[a-z ]{0,8}".prop_map(Op::Send),
        1 => Just(Op::Leave),
        1 => Just(Op::Dismiss),
        3 => (0..USERS.len(), "[a-z]{1,8}").prop_map(|(author, body)| Op::Receive { author, body }),
        2 => (0..USERS.len()).prop_map(Op::PresenceJoined),
        1 => (0..USERS.len()).prop_map(Op::PresenceLeft),
        3 => any::<bool>().prop_map(|stale| Op::Ack { stale }),
        1 => Just(Op::ServerError),
        1 => Just(Op::Disconnect),
        2 => (0u64..40_000).prop_map(Op::Tick),
    ]
}

/// App, Bridge and a transport that connects immediately.
struct Harness {
    env: MockEnv,
    app: App,
    bridge: Bridge<MockEnv>,
}

impl Harness {
    fn new() -> Self {
        let env = MockEnv::with_seed(7);
        let mut harness = Self {
            env: env.clone(),
            app: App::new("ws://localhost:4000".into()),
            bridge: Bridge::new(env, ClientConfig::default()),
        };
        let actions = harness.app.connect();
        harness.apply_actions(actions);
        harness
    }

    fn apply_actions(&mut self, actions: Vec<AppAction>) {
        for action in actions {
            if matches!(action, AppAction::Render | AppAction::Quit) {
                continue;
            }
            let events = self.bridge.process_app_action(action);
            self.apply_events(events);
        }
    }

    fn apply_events(&mut self, events: Vec<AppEvent>) {
        for event in events {
            self.app.handle(event);
        }
        // Transport connects instantly; anything else is a no-op here
        for command in self.bridge.take_commands() {
            if let TransportCommand::Connect { .. } = command {
                let events = self.bridge.handle_connected();
                self.apply_events(events);
            }
        }
    }

    fn inbound(&mut self, message: ServerMessage) {
        if self.bridge.client().connection_state() != ConnectionState::Connected {
            return;
        }
        let events = self.bridge.handle_transport(TransportEvent::Message(message));
        self.apply_events(events);
    }

    fn step(&mut self, op: Op) {
        match op {
            Op::Join { user, room, secret } => {
                let secret = secret.then(|| "hunter2".to_string());
                let actions = self.app.join_room(USERS[user], ROOMS[room], secret);
                self.apply_actions(actions);
            },
            Op::Send(body) => {
                let actions = self.app.send_message(body);
                self.apply_actions(actions);
            },
            Op::Leave => {
                let actions = self.app.leave_room();
                self.apply_actions(actions);
            },
            Op::Dismiss => {
                self.app.dismiss_notification();
            },
            Op::Receive { author, body } => {
                self.inbound(ServerMessage::ReceiveMessage(ReceiveMessage {
                    author: USERS[author].into(),
                    message: body,
                    timestamp: Utc::now(),
                }));
            },
            Op::PresenceJoined(user) => {
                self.inbound(ServerMessage::UserJoined(Presence {
                    username: USERS[user].into(),
                    timestamp: Utc::now(),
                }));
            },
            Op::PresenceLeft(user) => {
                self.inbound(ServerMessage::UserLeft(Presence {
                    username: USERS[user].into(),
                    timestamp: Utc::now(),
                }));
            },
            Op::Ack { stale } => {
                let Some(room) = self.bridge.client().pending_join_room().cloned() else {
                    return;
                };
                let seq = self.bridge.client().join_seq();
                let request_id = Some(if stale { seq.wrapping_sub(1) } else { seq });
                self.inbound(ServerMessage::RoomJoined(RoomJoined {
                    room: room.to_string(),
                    username: "whoever".into(),
                    request_id,
                }));
            },
            Op::ServerError => self.inbound(ServerMessage::Error("nope".into())),
            Op::Disconnect => {
                let events = self
                    .bridge
                    .handle_transport(TransportEvent::Disconnected { reason: "reset".into() });
                self.apply_events(events);
            },
            Op::Tick(millis) => {
                self.env.advance(Duration::from_millis(millis));
                let events = self.bridge.handle_tick(self.env.now());
                self.apply_events(events);
            },
        }
    }

    fn check(&self) -> Result<(), TestCaseError> {
        let client = self.bridge.client();
        let session = client.session();

        prop_assert_eq!(self.app.messages(), client.log().entries());
        prop_assert_eq!(self.app.log().stale, client.log().is_stale());
        prop_assert_eq!(self.app.connection_state(), session.connection_state);
        prop_assert_eq!(self.app.current_room(), session.current_room.as_ref());
        prop_assert_eq!(self.app.identity(), session.identity.as_deref());
        prop_assert!(self.app.notification_count() <= MAX_NOTIFICATIONS);
        if session.is_joined() {
            prop_assert_eq!(session.connection_state, ConnectionState::Connected);
        }
        Ok(())
    }
}

proptest! {
    #[test]
    fn prop_app_mirrors_client(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut harness = Harness::new();
        harness.check()?;

        for op in ops {
            harness.step(op);
            harness.check()?;
        }
    }

    #[test]
    fn prop_notifications_never_exceed_bound(errors in 0usize..100) {
        let mut harness = Harness::new();
        for _ in 0..errors {
            harness.step(Op::ServerError);
        }
        prop_assert!(harness.app.notification_count() <= MAX_NOTIFICATIONS);
        prop_assert_eq!(harness.app.notification_count(), errors.min(MAX_NOTIFICATIONS));
    }
}
