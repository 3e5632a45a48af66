//! Model world: real clients and a reference server with synchronous I/O.

use std::{collections::VecDeque, time::Duration};

use roomchat_app::{App, AppAction, AppEvent, Bridge, TransportCommand};
use roomchat_client::{ClientConfig, TransportEvent};
use roomchat_core::{Environment, env::test_utils::MockEnv};
use roomchat_proto::ServerMessage;

use super::operation::{ClientId, Operation, ROOM_IDS, USERNAMES};
use crate::{
    chat_server::{ChatServer, DEFAULT_ROOM_SECRET, ServerAction, ServerConfig, ServerEvent},
    invariants::{ClientSnapshot, SystemSnapshot},
};

/// One App/Bridge pair and its connection to the server.
struct Peer {
    app: App,
    bridge: Bridge<MockEnv>,
    /// Server session of the live transport.
    session: Option<u64>,
}

/// A server message on its way to a client.
struct InFlight {
    session: u64,
    message: ServerMessage,
}

/// Several clients talking to one reference server.
///
/// Transports connect instantly. Messages to the server are handled when
/// sent; messages from the server wait for [`Operation::DeliverPending`]
/// (or [`ModelWorld::deliver_all`]).
pub struct ModelWorld {
    env: MockEnv,
    server: ChatServer<MockEnv>,
    peers: Vec<Peer>,
    in_flight: VecDeque<InFlight>,
    next_session: u64,
    next_body: u64,
}

impl ModelWorld {
    /// Create a world with `num_clients` connected clients.
    pub fn new(num_clients: usize, seed: u64) -> Self {
        Self::with_config(num_clients, seed, ClientConfig::default(), ServerConfig::default())
    }

    /// Create a world with custom client and server configuration.
    pub fn with_config(
        num_clients: usize,
        seed: u64,
        client_config: ClientConfig,
        server_config: ServerConfig,
    ) -> Self {
        let env = MockEnv::with_seed(seed);
        let peers = (0..num_clients)
            .map(|_| Peer {
                app: App::new("model://server".into()),
                bridge: Bridge::new(env.clone(), client_config.clone()),
                session: None,
            })
            .collect();

        let mut world = Self {
            server: ChatServer::new(env.clone(), server_config),
            env,
            peers,
            in_flight: VecDeque::new(),
            next_session: 1,
            next_body: 0,
        };
        for index in 0..world.peers.len() {
            let actions = world.peers[index].app.connect();
            world.run_actions(index, actions);
        }
        world
    }

    /// Number of clients.
    pub fn num_clients(&self) -> usize {
        self.peers.len()
    }

    /// App of a client.
    pub fn app(&self, index: usize) -> Option<&App> {
        self.peers.get(index).map(|p| &p.app)
    }

    /// Server under test.
    pub fn server(&self) -> &ChatServer<MockEnv> {
        &self.server
    }

    /// Number of undelivered server messages.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Apply an operation.
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::Join { client_id, user, room, with_secret } => {
                let index = self.index(*client_id);
                let username = USERNAMES[usize::from(*user) % USERNAMES.len()];
                let room = ROOM_IDS[usize::from(*room) % ROOM_IDS.len()];
                let secret = with_secret.then(|| DEFAULT_ROOM_SECRET.to_string());
                let actions = self.peers[index].app.join_room(username, room, secret);
                self.run_actions(index, actions);
            },
            Operation::SendMessage { client_id, content } => {
                let index = self.index(*client_id);
                self.next_body += 1;
                let actions = self.peers[index].app.send_message(content.to_body(self.next_body));
                self.run_actions(index, actions);
            },
            Operation::LeaveRoom { client_id } => {
                let index = self.index(*client_id);
                let actions = self.peers[index].app.leave_room();
                self.run_actions(index, actions);
            },
            Operation::Disconnect { client_id } => {
                let index = self.index(*client_id);
                self.drop_transport(index);
            },
            Operation::Restart { client_id } => {
                let index = self.index(*client_id);
                let events = self.peers[index].bridge.shutdown();
                self.run_events(index, events);
                let actions = self.peers[index].app.connect();
                self.run_actions(index, actions);
            },
            Operation::AdvanceTime { millis } => {
                self.env.advance(Duration::from_millis(u64::from(*millis)));
                let now = self.env.now();
                for index in 0..self.peers.len() {
                    let events = self.peers[index].bridge.handle_tick(now);
                    self.run_events(index, events);
                }
            },
            Operation::DeliverPending => self.deliver_all(),
        }
    }

    /// Deliver queued server messages until none are left.
    pub fn deliver_all(&mut self) {
        while let Some(InFlight { session, message }) = self.in_flight.pop_front() {
            let Some(index) = self.peers.iter().position(|p| p.session == Some(session)) else {
                continue;
            };
            let events =
                self.peers[index].bridge.handle_transport(TransportEvent::Message(message));
            self.run_events(index, events);
        }
    }

    /// Observable state of every client and the server.
    pub fn snapshot(&self) -> SystemSnapshot {
        let clients = self
            .peers
            .iter()
            .enumerate()
            .map(|(i, p)| ClientSnapshot::capture(i as u64, &p.app, p.bridge.client()))
            .collect();
        SystemSnapshot::from_clients(clients).with_server(self.server.snapshot())
    }

    fn index(&self, client_id: ClientId) -> usize {
        usize::from(client_id) % self.peers.len()
    }

    /// Server closes the client's transport.
    fn drop_transport(&mut self, index: usize) {
        let Some(session) = self.peers[index].session.take() else {
            return;
        };
        let actions = self.server.handle(ServerEvent::Disconnected { session });
        self.queue(actions);
        let events = self.peers[index]
            .bridge
            .handle_transport(TransportEvent::Disconnected { reason: "server closed".into() });
        self.run_events(index, events);
    }

    fn run_actions(&mut self, index: usize, actions: Vec<AppAction>) {
        for action in actions {
            if matches!(action, AppAction::Render | AppAction::Quit) {
                continue;
            }
            let events = self.peers[index].bridge.process_app_action(action);
            self.run_events(index, events);
        }
    }

    fn run_events(&mut self, index: usize, events: Vec<AppEvent>) {
        for event in events {
            self.peers[index].app.handle(event);
        }

        loop {
            let commands = self.peers[index].bridge.take_commands();
            if commands.is_empty() {
                break;
            }
            for command in commands {
                let events = self.execute(index, command);
                for event in events {
                    self.peers[index].app.handle(event);
                }
            }
        }
    }

    fn execute(&mut self, index: usize, command: TransportCommand) -> Vec<AppEvent> {
        match command {
            TransportCommand::Connect { .. } => {
                if let Some(old) = self.peers[index].session.take() {
                    let actions = self.server.handle(ServerEvent::Disconnected { session: old });
                    self.queue(actions);
                }
                let session = self.next_session;
                self.next_session += 1;
                self.server.handle(ServerEvent::Connected { session });
                self.peers[index].session = Some(session);
                self.peers[index].bridge.handle_connected()
            },
            TransportCommand::Send(message) => {
                if let Some(session) = self.peers[index].session {
                    let actions = self.server.handle(ServerEvent::Received { session, message });
                    self.queue(actions);
                }
                Vec::new()
            },
            TransportCommand::Close { .. } => {
                if let Some(session) = self.peers[index].session.take() {
                    let actions = self.server.handle(ServerEvent::Disconnected { session });
                    self.queue(actions);
                }
                Vec::new()
            },
        }
    }

    fn queue(&mut self, actions: Vec<ServerAction>) {
        self.in_flight.extend(
            actions
                .into_iter()
                .map(|ServerAction::Send { session, message }| InFlight { session, message }),
        );
    }
}
