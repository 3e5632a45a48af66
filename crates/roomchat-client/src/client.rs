//! Client state machine.
//!
//! The `Client` owns one user's session: the connection lifecycle, at most
//! one room membership, and the message log for that membership. Nothing
//! blocks: intents only queue outbound messages and their outcomes arrive
//! later as inbound events.
//!
//! # Join sequencing
//!
//! Every JoinRoom increments a sequence number carried as `request_id`. An
//! acknowledgement is accepted only while a join is pending and only for the
//! latest sequence number, so a late reply to an earlier attempt (or one
//! that survives a disconnect) can never mark the session joined.

use std::{collections::VecDeque, time::Duration};

use roomchat_core::{
    Connection, ConnectionAction, ConnectionConfig, ConnectionState, Environment, Message,
    MessageLog, PresenceChange, RoomCatalog, RoomId,
};
use roomchat_proto::{
    ClientMessage, JoinRoom, LeaveRoom, Presence, ReceiveMessage, RoomJoined, SendMessage,
    ServerMessage,
};

use crate::{
    error::{ClientError, SendFailure, ValidationError},
    event::{ClientAction, ClientEvent},
    session::Session,
};

/// Time to wait for a join acknowledgement before re-sending.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Re-sends of an unacknowledged join before it is reported as rejected.
pub const DEFAULT_MAX_JOIN_RETRIES: u32 = 2;

/// Time to wait for the echo of a sent message.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Connect timeout and reconnect policy.
    pub connection: ConnectionConfig,
    /// Time to wait for a join acknowledgement.
    pub join_timeout: Duration,
    /// Re-sends of an unacknowledged join.
    pub max_join_retries: u32,
    /// Time to wait for a send echo.
    pub send_timeout: Duration,
    /// Rejoin the last room after an unplanned reconnect.
    pub resume_on_reconnect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            max_join_retries: DEFAULT_MAX_JOIN_RETRIES,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            resume_on_reconnect: true,
        }
    }
}

/// Acknowledged room membership.
#[derive(Debug, Clone)]
struct Membership {
    room: RoomId,
    username: String,
    secret: Option<String>,
}

/// Join sent but not yet acknowledged.
#[derive(Debug, Clone)]
struct PendingJoin<I> {
    target: Membership,
    seq: u64,
    sent_at: I,
    retries: u32,
}

/// Send awaiting its echo.
#[derive(Debug, Clone)]
struct PendingSend<I> {
    body: String,
    sent_at: I,
}

/// Session client for one user.
pub struct Client<E: Environment> {
    /// Environment for time and randomness.
    env: E,

    config: ClientConfig,

    catalog: RoomCatalog,

    connection: Connection<E::Instant>,

    /// Sequence number of the most recent JoinRoom.
    join_seq: u64,

    pending_join: Option<PendingJoin<E::Instant>>,

    membership: Option<Membership>,

    /// The server on this connection acknowledges joins with `room_joined`,
    /// so presence alone no longer completes a join.
    acks_seen: bool,

    /// Membership to restore after the next successful reconnect.
    resume: Option<Membership>,

    /// Sends awaiting echo, oldest first.
    pending_sends: VecDeque<PendingSend<E::Instant>>,

    log: MessageLog,
}

impl<E: Environment> Client<E> {
    /// Create a disconnected client with the standard room catalog.
    pub fn new(env: E, config: ClientConfig) -> Self {
        Self::with_catalog(env, config, RoomCatalog::standard())
    }

    /// Create a disconnected client with a custom room catalog.
    pub fn with_catalog(env: E, config: ClientConfig, catalog: RoomCatalog) -> Self {
        let connection = Connection::new(config.connection.clone());
        Self {
            env,
            config,
            catalog,
            connection,
            join_seq: 0,
            pending_join: None,
            membership: None,
            acks_seen: false,
            resume: None,
            pending_sends: VecDeque::new(),
            log: MessageLog::new(),
        }
    }

    /// Read-only view of connection, room and identity.
    pub fn session(&self) -> Session {
        Session {
            connection_state: self.connection.state(),
            current_room: self.membership.as_ref().map(|m| m.room.clone()),
            identity: self.membership.as_ref().map(|m| m.username.clone()),
        }
    }

    /// Message log for the current (or last) membership.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Rooms that can be joined.
    pub fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether a join has been acknowledged.
    pub fn is_joined(&self) -> bool {
        self.membership.is_some()
    }

    /// Sequence number of the most recent JoinRoom. Zero before the first.
    pub fn join_seq(&self) -> u64 {
        self.join_seq
    }

    /// Room of the join in flight, if any.
    pub fn pending_join_room(&self) -> Option<&RoomId> {
        self.pending_join.as_ref().map(|p| &p.target.room)
    }

    /// Sends still waiting for their echo.
    pub fn pending_send_count(&self) -> usize {
        self.pending_sends.len()
    }

    /// Process an event and return resulting actions.
    ///
    /// An `Err` means the intent was rejected locally and nothing was
    /// emitted.
    pub fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Open => self.handle_open(),
            ClientEvent::TransportConnected => self.handle_connected(),
            ClientEvent::TransportDisconnected { reason } => Ok(self.handle_drop(reason, false)),
            ClientEvent::TransportFault { reason } => Ok(self.handle_drop(reason, true)),
            ClientEvent::JoinRoom { username, room_id, secret } => {
                self.handle_join_room(&username, &room_id, secret)
            },
            ClientEvent::SendMessage { body } => self.handle_send_message(body),
            ClientEvent::LeaveRoom => Ok(self.handle_leave_room()),
            ClientEvent::Close => Ok(self.handle_close()),
            ClientEvent::Inbound(message) => Ok(self.handle_inbound(message)),
            ClientEvent::Tick { now } => Ok(self.handle_tick(now)),
        }
    }

    fn handle_open(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        let actions = self.connection.open(self.env.now())?;
        tracing::info!("connecting");
        Ok(self.convert_connection_actions(actions))
    }

    fn handle_connected(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        self.connection.on_connected()?;
        tracing::info!("connected");

        self.acks_seen = false;
        let mut actions = vec![ClientAction::ConnectionChanged(ConnectionState::Connected)];

        if let Some(target) = self.resume.take() {
            tracing::info!(room = %target.room, username = %target.username, "resuming membership");
            actions.extend(self.start_join(target));
        }

        Ok(actions)
    }

    /// Unplanned transport loss. Clears membership, marks the log stale and
    /// fails everything in flight.
    fn handle_drop(&mut self, reason: String, fault: bool) -> Vec<ClientAction> {
        if self.connection.state() == ConnectionState::Disconnected {
            tracing::debug!(%reason, "ignoring disconnect from discarded transport");
            return Vec::new();
        }

        tracing::info!(%reason, fault, "connection lost");

        let mut actions = Vec::new();
        if fault {
            actions.push(ClientAction::CloseTransport { reason: reason.clone() });
        }

        if let Some(membership) = self.membership.take() {
            if self.config.resume_on_reconnect {
                self.resume = Some(membership);
            }
        }

        if let Some(pending) = self.pending_join.take() {
            actions.push(ClientAction::Notify(ClientError::JoinRejected {
                room: pending.target.room.to_string(),
                reason: "connection lost".to_string(),
            }));
        }

        for _ in self.pending_sends.drain(..) {
            actions
                .push(ClientAction::Notify(ClientError::SendRejected(SendFailure::Disconnected)));
        }

        self.log.mark_stale();

        let now = self.env.now();
        let connection_actions = self.connection.on_disconnected(&self.env, now);
        actions.push(ClientAction::ConnectionChanged(ConnectionState::Disconnected));
        actions.extend(self.convert_connection_actions(connection_actions));

        actions
    }

    fn handle_join_room(
        &mut self,
        username: &str,
        room_id: &str,
        secret: Option<String>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }

        let room = self
            .catalog
            .get(room_id)
            .ok_or_else(|| ValidationError::UnknownRoom { room: room_id.to_string() })?;

        let secret = if room.requires_secret {
            match secret {
                Some(secret) if !secret.trim().is_empty() => Some(secret),
                _ => {
                    return Err(ValidationError::MissingSecret { room: room_id.to_string() }.into());
                },
            }
        } else {
            None
        };

        if self.connection.state() != ConnectionState::Connected {
            return Err(ClientError::NotConnected);
        }

        let target = Membership { room: room.id.clone(), username: username.to_string(), secret };

        let mut actions = self.leave_current();
        self.resume = None;
        actions.extend(self.start_join(target));

        Ok(actions)
    }

    /// Clear the log for a new membership and send `join_room` under a fresh
    /// sequence number.
    fn start_join(&mut self, target: Membership) -> Vec<ClientAction> {
        self.join_seq += 1;
        self.log.reset(target.room.clone());

        let message = join_message(&target, self.join_seq);

        tracing::debug!(room = %target.room, seq = self.join_seq, "joining");

        let actions = vec![
            ClientAction::LogCleared { room: target.room.clone() },
            ClientAction::Send(message),
        ];

        self.pending_join =
            Some(PendingJoin { target, seq: self.join_seq, sent_at: self.env.now(), retries: 0 });

        actions
    }

    /// End the current membership or cancel the join in flight, sending
    /// `leave_room` for it.
    fn leave_current(&mut self) -> Vec<ClientAction> {
        if let Some(membership) = self.membership.take() {
            self.pending_sends.clear();
            self.log.mark_stale();
            return vec![
                ClientAction::Send(ClientMessage::LeaveRoom(LeaveRoom {
                    room: membership.room.to_string(),
                })),
                ClientAction::Left { room: membership.room },
            ];
        }

        if let Some(pending) = self.pending_join.take() {
            self.log.mark_stale();
            return vec![
                ClientAction::Send(ClientMessage::LeaveRoom(LeaveRoom {
                    room: pending.target.room.to_string(),
                })),
                ClientAction::Left { room: pending.target.room },
            ];
        }

        Vec::new()
    }

    fn handle_send_message(&mut self, body: String) -> Result<Vec<ClientAction>, ClientError> {
        let Some(membership) = &self.membership else {
            return Err(ClientError::SendRejected(SendFailure::NotJoined));
        };

        if body.trim().is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let message = ClientMessage::SendMessage(SendMessage {
            message: body.clone(),
            room: membership.room.to_string(),
        });

        self.pending_sends.push_back(PendingSend { body, sent_at: self.env.now() });

        Ok(vec![ClientAction::Send(message)])
    }

    fn handle_leave_room(&mut self) -> Vec<ClientAction> {
        self.resume = None;
        self.leave_current()
    }

    fn handle_close(&mut self) -> Vec<ClientAction> {
        let was = self.connection.state();
        let mut actions =
            if was == ConnectionState::Connected { self.leave_current() } else { Vec::new() };

        self.membership = None;
        self.pending_join = None;
        self.pending_sends.clear();
        self.resume = None;
        self.log.mark_stale();

        let closed = self.connection.close("closed by user");
        actions.extend(self.convert_connection_actions(closed));
        if was != ConnectionState::Disconnected {
            actions.push(ClientAction::ConnectionChanged(ConnectionState::Disconnected));
        }

        tracing::info!("closed");
        actions
    }

    fn handle_inbound(&mut self, message: ServerMessage) -> Vec<ClientAction> {
        match message {
            ServerMessage::ReceiveMessage(received) => self.handle_receive_message(received),
            ServerMessage::UserJoined(presence) => self.handle_user_joined(presence),
            ServerMessage::UserLeft(presence) => {
                self.append_presence(&presence, PresenceChange::Left)
            },
            ServerMessage::RoomJoined(ack) => self.handle_room_joined(ack),
            ServerMessage::Error(reason) => self.handle_server_error(reason),
        }
    }

    fn handle_receive_message(&mut self, received: ReceiveMessage) -> Vec<ClientAction> {
        let Some(membership) = &self.membership else {
            tracing::debug!(author = %received.author, "ignoring message while not joined");
            return Vec::new();
        };

        if received.author == membership.username
            && let Some(index) = self.pending_sends.iter().position(|p| p.body == received.message)
        {
            self.pending_sends.remove(index);
        }

        let entry = Message::user(received.author, received.message, received.timestamp);
        self.append(entry)
    }

    fn handle_user_joined(&mut self, presence: Presence) -> Vec<ClientAction> {
        let acknowledges = !self.acks_seen
            && self
                .pending_join
                .as_ref()
                .is_some_and(|pending| pending.target.username == presence.username);

        let mut actions = Vec::new();
        if acknowledges {
            actions.extend(self.complete_join());
        }
        actions.extend(self.append_presence(&presence, PresenceChange::Joined));
        actions
    }

    fn handle_room_joined(&mut self, ack: RoomJoined) -> Vec<ClientAction> {
        self.acks_seen = true;
        let Some(pending) = &self.pending_join else {
            tracing::debug!(
                room = %ack.room,
                request_id = ?ack.request_id,
                "ignoring join ack with no join pending"
            );
            return Vec::new();
        };

        let seq_matches = ack.request_id.is_none_or(|id| id == pending.seq);
        if !seq_matches || pending.target.room != ack.room.as_str() {
            tracing::debug!(
                room = %ack.room,
                request_id = ?ack.request_id,
                latest = pending.seq,
                "ignoring stale join ack"
            );
            return Vec::new();
        }

        self.complete_join()
    }

    fn complete_join(&mut self) -> Vec<ClientAction> {
        let Some(pending) = self.pending_join.take() else {
            return Vec::new();
        };

        let membership = pending.target;
        tracing::info!(room = %membership.room, username = %membership.username, "joined");

        let action = ClientAction::Joined {
            room: membership.room.clone(),
            username: membership.username.clone(),
        };
        self.membership = Some(membership);
        vec![action]
    }

    fn handle_server_error(&mut self, reason: String) -> Vec<ClientAction> {
        tracing::warn!(%reason, "server error");

        let error = if let Some(pending) = self.pending_join.take() {
            self.log.mark_stale();
            ClientError::JoinRejected { room: pending.target.room.to_string(), reason }
        } else if self.pending_sends.pop_front().is_some() {
            ClientError::SendRejected(SendFailure::Server(reason))
        } else {
            ClientError::ServerFault { reason }
        };

        vec![ClientAction::Notify(error)]
    }

    fn append_presence(
        &mut self,
        presence: &Presence,
        change: PresenceChange,
    ) -> Vec<ClientAction> {
        if self.membership.is_none() {
            tracing::debug!(username = %presence.username, "ignoring presence while not joined");
            return Vec::new();
        }
        self.append(Message::presence(&presence.username, change, presence.timestamp))
    }

    fn append(&mut self, entry: Message) -> Vec<ClientAction> {
        if self.log.append(entry.clone()) { vec![ClientAction::Deliver(entry)] } else { Vec::new() }
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<ClientAction> {
        let before = self.connection.state();
        let connection_actions = self.connection.tick(&self.env, now);
        let mut actions = self.convert_connection_actions(connection_actions);

        // Connect timeout: the attempt is abandoned without a transport signal
        if before == ConnectionState::Connecting
            && self.connection.state() == ConnectionState::Disconnected
        {
            tracing::info!("connect attempt timed out");
            actions.push(ClientAction::ConnectionChanged(ConnectionState::Disconnected));
        }

        actions.extend(self.check_join_timeout(now));
        actions.extend(self.check_send_timeouts(now));

        actions
    }

    fn check_join_timeout(&mut self, now: E::Instant) -> Vec<ClientAction> {
        let Some(pending) = &mut self.pending_join else {
            return Vec::new();
        };

        if now - pending.sent_at < self.config.join_timeout {
            return Vec::new();
        }

        if pending.retries < self.config.max_join_retries {
            pending.retries += 1;
            pending.sent_at = now;
            tracing::debug!(
                room = %pending.target.room,
                seq = pending.seq,
                retry = pending.retries,
                "re-sending join"
            );
            return vec![ClientAction::Send(join_message(&pending.target, pending.seq))];
        }

        let attempts = pending.retries + 1;
        let room = pending.target.room.to_string();
        self.pending_join = None;
        self.log.mark_stale();

        tracing::warn!(%room, attempts, "join not acknowledged");
        vec![ClientAction::Notify(ClientError::JoinRejected {
            room,
            reason: format!("no acknowledgement after {attempts} attempts"),
        })]
    }

    fn check_send_timeouts(&mut self, now: E::Instant) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        while let Some(oldest) = self.pending_sends.front() {
            if now - oldest.sent_at < self.config.send_timeout {
                break;
            }
            self.pending_sends.pop_front();
            actions.push(ClientAction::Notify(ClientError::SendRejected(SendFailure::Timeout)));
        }
        actions
    }

    fn convert_connection_actions(&self, actions: Vec<ConnectionAction>) -> Vec<ClientAction> {
        let mut converted = Vec::new();
        for action in actions {
            match action {
                ConnectionAction::Connect { attempt } => {
                    converted.push(ClientAction::ConnectionChanged(ConnectionState::Connecting));
                    converted.push(ClientAction::Connect { attempt });
                },
                ConnectionAction::Close { reason } => {
                    converted.push(ClientAction::CloseTransport { reason });
                },
                ConnectionAction::GiveUp { attempts } => {
                    tracing::warn!(attempts, "reconnect abandoned");
                    converted.push(ClientAction::Notify(ClientError::TransportFault {
                        reason: format!("gave up after {attempts} reconnect attempts"),
                    }));
                },
            }
        }
        converted
    }
}

fn join_message(target: &Membership, seq: u64) -> ClientMessage {
    ClientMessage::JoinRoom(JoinRoom {
        room: target.room.to_string(),
        username: target.username.clone(),
        password: target.secret.clone(),
        request_id: Some(seq),
    })
}

#[cfg(test)]
mod tests {
    use roomchat_core::env::test_utils::MockEnv;

    use super::*;

    fn connected_client() -> Client<MockEnv> {
        let mut client = Client::new(MockEnv::new(), ClientConfig::default());
        client.handle(ClientEvent::Open).unwrap();
        client.handle(ClientEvent::TransportConnected).unwrap();
        client
    }

    fn join(client: &mut Client<MockEnv>, username: &str, room: &str) -> Vec<ClientAction> {
        client
            .handle(ClientEvent::JoinRoom {
                username: username.into(),
                room_id: room.into(),
                secret: None,
            })
            .unwrap()
    }

    #[test]
    fn create_client() {
        let client = Client::new(MockEnv::new(), ClientConfig::default());

        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
        assert_eq!(client.join_seq(), 0);
        assert!(!client.is_joined());
        assert_eq!(client.catalog().len(), 7);
    }

    #[test]
    fn open_emits_connect() {
        let mut client = Client::new(MockEnv::new(), ClientConfig::default());
        let actions = client.handle(ClientEvent::Open).unwrap();

        assert_eq!(actions, vec![
            ClientAction::ConnectionChanged(ConnectionState::Connecting),
            ClientAction::Connect { attempt: 0 },
        ]);
    }

    #[test]
    fn join_before_connect_fails() {
        let mut client = Client::new(MockEnv::new(), ClientConfig::default());
        let result = client.handle(ClientEvent::JoinRoom {
            username: "alice".into(),
            room_id: "general".into(),
            secret: None,
        });
        assert_eq!(result, Err(ClientError::NotConnected));
    }

    #[test]
    fn join_sends_trimmed_username_and_seq() {
        let mut client = connected_client();
        let actions = join(&mut client, "  alice ", "general");

        assert_eq!(actions, vec![
            ClientAction::LogCleared { room: RoomId::new("general") },
            ClientAction::Send(ClientMessage::JoinRoom(JoinRoom {
                room: "general".into(),
                username: "alice".into(),
                password: None,
                request_id: Some(1),
            })),
        ]);
        assert_eq!(client.pending_join_room(), Some(&RoomId::new("general")));
    }

    #[test]
    fn secret_only_sent_to_protected_rooms() {
        let mut client = connected_client();
        let actions = client
            .handle(ClientEvent::JoinRoom {
                username: "bob".into(),
                room_id: "music".into(),
                secret: Some("ignored".into()),
            })
            .unwrap();

        let sent_password = actions.iter().find_map(|action| match action {
            ClientAction::Send(ClientMessage::JoinRoom(join)) => Some(join.password.clone()),
            _ => None,
        });
        assert_eq!(sent_password, Some(None));
    }

    #[test]
    fn switching_rooms_leaves_first() {
        let mut client = connected_client();
        join(&mut client, "alice", "general");
        client
            .handle(ClientEvent::Inbound(ServerMessage::RoomJoined(RoomJoined {
                room: "general".into(),
                username: "alice".into(),
                request_id: Some(1),
            })))
            .unwrap();

        let actions = join(&mut client, "alice", "tech");
        assert_eq!(
            actions[0],
            ClientAction::Send(ClientMessage::LeaveRoom(LeaveRoom { room: "general".into() }))
        );
        assert_eq!(actions[1], ClientAction::Left { room: RoomId::new("general") });
        assert!(!client.is_joined());
        assert_eq!(client.join_seq(), 2);
    }

    #[test]
    fn presence_does_not_complete_join_once_acks_seen() {
        let mut client = connected_client();
        join(&mut client, "alice", "general");
        client
            .handle(ClientEvent::Inbound(ServerMessage::RoomJoined(RoomJoined {
                room: "general".into(),
                username: "alice".into(),
                request_id: Some(1),
            })))
            .unwrap();
        join(&mut client, "alice", "tech");

        // Late presence echo from the previous room
        client
            .handle(ClientEvent::Inbound(ServerMessage::UserJoined(Presence {
                username: "alice".into(),
                timestamp: chrono::Utc::now(),
            })))
            .unwrap();

        assert!(!client.is_joined());
        assert_eq!(client.pending_join_room(), Some(&RoomId::new("tech")));
    }

    #[test]
    fn leave_without_membership_is_noop() {
        let mut client = connected_client();
        assert!(client.handle(ClientEvent::LeaveRoom).unwrap().is_empty());
    }

    #[test]
    fn leave_cancels_pending_join() {
        let mut client = connected_client();
        join(&mut client, "alice", "coding");

        let actions = client.handle(ClientEvent::LeaveRoom).unwrap();
        assert_eq!(actions, vec![
            ClientAction::Send(ClientMessage::LeaveRoom(LeaveRoom { room: "coding".into() })),
            ClientAction::Left { room: RoomId::new("coding") },
        ]);
        assert_eq!(client.pending_join_room(), None);
    }

    #[test]
    fn switching_during_pending_join_reports_cancel() {
        let mut client = connected_client();
        join(&mut client, "alice", "coding");

        let actions = join(&mut client, "alice", "music");
        assert_eq!(actions[1], ClientAction::Left { room: RoomId::new("coding") });
        assert_eq!(actions[2], ClientAction::LogCleared { room: RoomId::new("music") });
        assert_eq!(client.pending_join_room(), Some(&RoomId::new("music")));
    }

    #[test]
    fn server_error_without_pending_is_server_fault() {
        let mut client = connected_client();
        let actions =
            client.handle(ClientEvent::Inbound(ServerMessage::Error("boom".into()))).unwrap();
        assert_eq!(actions, vec![ClientAction::Notify(ClientError::ServerFault {
            reason: "boom".into()
        })]);
    }

    #[test]
    fn close_is_not_followed_by_reconnect() {
        let env = MockEnv::new();
        let mut client = Client::new(env.clone(), ClientConfig::default());
        client.handle(ClientEvent::Open).unwrap();
        client.handle(ClientEvent::TransportConnected).unwrap();

        let actions = client.handle(ClientEvent::Close).unwrap();
        assert!(actions.contains(&ClientAction::ConnectionChanged(ConnectionState::Disconnected)));

        env.advance(Duration::from_secs(120));
        let actions = client.handle(ClientEvent::Tick { now: env.now() }).unwrap();
        assert!(actions.is_empty());
    }
}
