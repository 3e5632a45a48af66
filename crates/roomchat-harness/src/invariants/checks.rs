//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::{BTreeMap, HashSet};

use roomchat_app::MAX_NOTIFICATIONS;
use roomchat_core::ConnectionState;

use super::{Invariant, InvariantKind, InvariantResult, SystemSnapshot};

/// The App's log must equal the session client's log.
///
/// Same entries in the same order, and the same stale flag. A mismatch
/// means the App missed or invented a delivery.
pub struct LogMirrorsClient;

impl Invariant for LogMirrorsClient {
    fn kind(&self) -> InvariantKind {
        InvariantKind::LogMirrorsClient
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.app_log != client.log {
                return Err(self.violation(format!(
                    "client {}: app shows {} entries, session has {}",
                    client.id,
                    client.app_log.len(),
                    client.log.len()
                )));
            }
            if client.app_log_stale != client.log_stale {
                return Err(self.violation(format!(
                    "client {}: app stale={}, session stale={}",
                    client.id, client.app_log_stale, client.log_stale
                )));
            }
        }
        Ok(())
    }
}

/// A joined session must be connected, and the App must agree on the
/// connection state.
pub struct JoinedImpliesConnected;

impl Invariant for JoinedImpliesConnected {
    fn kind(&self) -> InvariantKind {
        InvariantKind::JoinedImpliesConnected
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.room.is_some() && client.connection != ConnectionState::Connected {
                return Err(self.violation(format!(
                    "client {}: joined {:?} while {:?}",
                    client.id, client.room, client.connection
                )));
            }
            if client.app_connection != client.connection {
                return Err(self.violation(format!(
                    "client {}: app shows {:?}, session is {:?}",
                    client.id, client.app_connection, client.connection
                )));
            }
        }
        Ok(())
    }
}

/// Room and identity are set and cleared together, and the App shows the
/// session's values.
pub struct IdentityMatchesRoom;

impl Invariant for IdentityMatchesRoom {
    fn kind(&self) -> InvariantKind {
        InvariantKind::IdentityMatchesRoom
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.room.is_some() != client.identity.is_some() {
                return Err(self.violation(format!(
                    "client {}: room {:?} with identity {:?}",
                    client.id, client.room, client.identity
                )));
            }
            if client.app_room != client.room || client.app_identity != client.identity {
                return Err(self.violation(format!(
                    "client {}: app shows {:?}/{:?}, session has {:?}/{:?}",
                    client.id,
                    client.app_room,
                    client.app_identity,
                    client.room,
                    client.identity
                )));
            }
        }
        Ok(())
    }
}

/// The notification queue drops its oldest entry instead of growing.
pub struct NotificationBound;

impl Invariant for NotificationBound {
    fn kind(&self) -> InvariantKind {
        InvariantKind::NotificationBound
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.notifications > MAX_NOTIFICATIONS {
                return Err(self.violation(format!(
                    "client {}: {} notifications queued",
                    client.id, client.notifications
                )));
            }
        }
        Ok(())
    }
}

/// Every joined client is a member of that room on the server.
///
/// Only meaningful when no messages are in flight. Passes trivially when
/// the snapshot carries no server state.
pub struct ServerMembership;

impl Invariant for ServerMembership {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ServerMembership
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(server) = &state.server else {
            return Ok(());
        };

        for client in &state.clients {
            if let (Some(room), Some(identity)) = (&client.room, &client.identity)
                && !server.is_member(room, identity)
            {
                return Err(self.violation(format!(
                    "client {}: joined {room} as {identity}, server members {:?}",
                    client.id,
                    server.rooms.get(room)
                )));
            }
        }
        Ok(())
    }
}

/// Members of the same room see the room's messages in the same order.
///
/// Compares the relative order of user-message bodies that both clients
/// logged. Bodies must be unique for the comparison to be meaningful.
pub struct MessageOrderAgreement;

impl Invariant for MessageOrderAgreement {
    fn kind(&self) -> InvariantKind {
        InvariantKind::MessageOrderAgreement
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut by_room: BTreeMap<&str, Vec<(u64, Vec<&str>)>> = BTreeMap::new();
        for client in &state.clients {
            if let Some(room) = &client.room {
                by_room.entry(room.as_str()).or_default().push((client.id, client.user_bodies()));
            }
        }

        for (room, members) in by_room {
            let Some(((first_id, first), rest)) = members.split_first() else {
                continue;
            };
            let mine: HashSet<&str> = first.iter().copied().collect();
            for (other_id, other) in rest {
                let theirs: HashSet<&str> = other.iter().copied().collect();
                let a: Vec<&str> = first.iter().copied().filter(|b| theirs.contains(b)).collect();
                let b: Vec<&str> = other.iter().copied().filter(|b| mine.contains(b)).collect();
                if a != b {
                    return Err(self.violation(format!(
                        "room {room}: client {first_id} sees {a:?}, \
                         client {other_id} sees {b:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}
