//! Reference chat server.
//!
//! A sans-IO implementation of the server side of the wire protocol, used
//! by the simulation to give clients something real to talk to. It follows
//! the same action pattern as the client: feed a [`ServerEvent`], execute
//! the returned [`ServerAction`]s.
//!
//! Rooms come from a [`RoomCatalog`]; rooms that require a secret accept
//! a join only when the password equals [`ServerConfig::room_secret`].
//! Every message is broadcast to all members of the room, the sender
//! included, which is how clients learn their send succeeded.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use roomchat_core::{Environment, RoomCatalog};
use roomchat_proto::{
    ClientMessage, JoinRoom, LeaveRoom, Presence, ReceiveMessage, RoomJoined, SendMessage,
    ServerMessage,
};

use crate::invariants::ServerSnapshot;

/// Shared secret for protected rooms unless configured otherwise.
pub const DEFAULT_ROOM_SECRET: &str = "opensesame";

/// Reference server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Rooms clients may join.
    pub catalog: RoomCatalog,
    /// Password for rooms that require a secret.
    pub room_secret: String,
    /// Reply to `join_room` with `room_joined`. When disabled the client
    /// can only learn of the join from its own `user_joined`.
    pub ack_joins: bool,
    /// Drop `join_room` requests on the floor (exercises client retries).
    pub ignore_joins: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            catalog: RoomCatalog::standard(),
            room_secret: DEFAULT_ROOM_SECRET.to_string(),
            ack_joins: true,
            ignore_joins: false,
        }
    }
}

/// Inputs to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A connection was accepted.
    Connected {
        /// Connection id.
        session: u64,
    },
    /// A decoded message arrived on a connection.
    Received {
        /// Connection id.
        session: u64,
        /// Decoded message.
        message: ClientMessage,
    },
    /// A connection closed.
    Disconnected {
        /// Connection id.
        session: u64,
    },
}

/// Instructions for the I/O layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAction {
    /// Write a message to one connection.
    Send {
        /// Target connection.
        session: u64,
        /// Message to write.
        message: ServerMessage,
    },
}

#[derive(Debug, Default)]
struct Membership {
    room: Option<String>,
    username: Option<String>,
}

/// Sans-IO reference chat server.
pub struct ChatServer<E: Environment> {
    env: E,
    config: ServerConfig,
    sessions: HashMap<u64, Membership>,
    /// Room id to member connections, ordered for deterministic broadcast.
    rooms: BTreeMap<String, BTreeSet<u64>>,
}

impl<E: Environment> ChatServer<E> {
    /// Create a server with the given environment and configuration.
    pub fn new(env: E, config: ServerConfig) -> Self {
        Self { env, config, sessions: HashMap::new(), rooms: BTreeMap::new() }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ServerEvent) -> Vec<ServerAction> {
        match event {
            ServerEvent::Connected { session } => {
                self.sessions.insert(session, Membership::default());
                Vec::new()
            },
            ServerEvent::Received { session, message } => {
                if !self.sessions.contains_key(&session) {
                    tracing::warn!(session, "message from unknown session");
                    return Vec::new();
                }
                match message {
                    ClientMessage::JoinRoom(join) => self.join(session, join),
                    ClientMessage::SendMessage(send) => self.broadcast_message(session, send),
                    ClientMessage::LeaveRoom(leave) => self.leave(session, &leave),
                }
            },
            ServerEvent::Disconnected { session } => {
                let actions = self.vacate(session);
                self.sessions.remove(&session);
                actions
            },
        }
    }

    fn join(&mut self, session: u64, join: JoinRoom) -> Vec<ServerAction> {
        if self.config.ignore_joins {
            tracing::debug!(session, room = %join.room, "ignoring join");
            return Vec::new();
        }

        let username = join.username.trim().to_string();
        if username.is_empty() {
            return vec![error(session, "username is required")];
        }
        let Some(room) = self.config.catalog.get(&join.room) else {
            return vec![error(session, &format!("unknown room: {}", join.room))];
        };
        let secret_ok = join.password.as_deref() == Some(self.config.room_secret.as_str());
        if room.requires_secret && !secret_ok {
            return vec![error(session, "invalid password")];
        }
        let taken = self.members(&join.room).any(|(s, name)| s != session && name == username);
        if taken {
            return vec![error(session, &format!("username {username} is taken"))];
        }

        let mut actions = self.vacate(session);
        if let Some(membership) = self.sessions.get_mut(&session) {
            membership.room = Some(join.room.clone());
            membership.username = Some(username.clone());
        }
        self.rooms.entry(join.room.clone()).or_default().insert(session);

        if self.config.ack_joins {
            actions.push(ServerAction::Send {
                session,
                message: ServerMessage::RoomJoined(RoomJoined {
                    room: join.room.clone(),
                    username: username.clone(),
                    request_id: join.request_id,
                }),
            });
        }

        let presence = Presence { username, timestamp: self.env.wall_clock() };
        actions.extend(self.broadcast(&join.room, &ServerMessage::UserJoined(presence)));
        actions
    }

    fn broadcast_message(&mut self, session: u64, send: SendMessage) -> Vec<ServerAction> {
        let Some((room, author)) = self.membership(session) else {
            return vec![error(session, "join a room first")];
        };
        if room != send.room {
            return vec![error(session, &format!("not a member of {}", send.room))];
        }
        if send.message.trim().is_empty() {
            return vec![error(session, "message is empty")];
        }

        let message = ServerMessage::ReceiveMessage(ReceiveMessage {
            author,
            message: send.message,
            timestamp: self.env.wall_clock(),
        });
        self.broadcast(&room, &message)
    }

    fn leave(&mut self, session: u64, leave: &LeaveRoom) -> Vec<ServerAction> {
        match self.membership(session) {
            Some((room, _)) if room == leave.room => self.vacate(session),
            _ => {
                tracing::debug!(session, room = %leave.room, "leave for a room not joined");
                Vec::new()
            },
        }
    }

    /// Remove a session from its room and tell the remaining members.
    fn vacate(&mut self, session: u64) -> Vec<ServerAction> {
        let Some(membership) = self.sessions.get_mut(&session) else {
            return Vec::new();
        };
        let (Some(room), Some(username)) = (membership.room.take(), membership.username.take())
        else {
            return Vec::new();
        };

        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(&session);
            if members.is_empty() {
                self.rooms.remove(&room);
            }
        }

        let presence = Presence { username, timestamp: self.env.wall_clock() };
        self.broadcast(&room, &ServerMessage::UserLeft(presence))
    }

    fn broadcast(&self, room: &str, message: &ServerMessage) -> Vec<ServerAction> {
        self.rooms
            .get(room)
            .into_iter()
            .flatten()
            .map(|&session| ServerAction::Send { session, message: message.clone() })
            .collect()
    }

    fn membership(&self, session: u64) -> Option<(String, String)> {
        let membership = self.sessions.get(&session)?;
        Some((membership.room.clone()?, membership.username.clone()?))
    }

    fn members<'a>(&'a self, room: &str) -> impl Iterator<Item = (u64, &'a str)> + 'a {
        self.rooms.get(room).into_iter().flatten().filter_map(|session| {
            let username = self.sessions.get(session)?.username.as_deref()?;
            Some((*session, username))
        })
    }

    /// Usernames in a room, in connection order.
    pub fn usernames(&self, room: &str) -> Vec<String> {
        self.members(room).map(|(_, name)| name.to_string()).collect()
    }

    /// Number of open connections.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Observable server state for invariant checks.
    pub fn snapshot(&self) -> ServerSnapshot {
        let rooms = self
            .rooms
            .keys()
            .map(|room| (room.clone(), self.usernames(room).into_iter().collect()))
            .collect();
        ServerSnapshot { rooms }
    }
}

fn error(session: u64, reason: &str) -> ServerAction {
    ServerAction::Send { session, message: ServerMessage::Error(reason.to_string()) }
}
