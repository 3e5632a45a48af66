//! Properties checked against every simulated step.
//!
//! Each check reads a [`SystemSnapshot`]: per-client views captured from the
//! App and the session client, plus the reference server's membership table.
//! Checks never mutate anything, so they can run after every operation.
//!
//! Two registries exist. [`InvariantRegistry::standard`] holds per-client
//! properties that survive messages in flight. [`InvariantRegistry::quiescent`]
//! adds cross-client properties that only hold after everything is delivered.
//!
//! ```ignore
//! let snapshot = world.snapshot();
//! InvariantRegistry::standard().check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    IdentityMatchesRoom, JoinedImpliesConnected, LogMirrorsClient, MessageOrderAgreement,
    NotificationBound, ServerMembership,
};
pub use snapshot::{ClientSnapshot, ServerSnapshot, SystemSnapshot};

/// Outcome of one check.
pub type InvariantResult = Result<(), Violation>;

/// Known invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantKind {
    /// App log and stale flag equal the session log.
    LogMirrorsClient,
    /// A joined session has a live connection.
    JoinedImpliesConnected,
    /// Room and identity are set together, in App and client alike.
    IdentityMatchesRoom,
    /// Notification queue never exceeds its bound.
    NotificationBound,
    /// The server lists every joined client as a member.
    ServerMembership,
    /// Members of a room see the room's messages in the same order.
    MessageOrderAgreement,
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A failed check.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Which property failed.
    pub invariant: InvariantKind,
    /// Offending client or room, and the values seen.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property of a [`SystemSnapshot`].
pub trait Invariant: Send + Sync {
    /// Name used in violations.
    fn kind(&self) -> InvariantKind;

    /// `Err` with the first offending client or room.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;

    /// Build a violation of this invariant.
    fn violation(&self, message: String) -> Violation {
        Violation { invariant: self.kind(), message }
    }
}

/// Set of checks run together.
pub struct InvariantRegistry {
    checks: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// No checks.
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Per-client checks that hold at every step, even with messages in
    /// flight: [`LogMirrorsClient`], [`JoinedImpliesConnected`],
    /// [`IdentityMatchesRoom`] and [`NotificationBound`].
    pub fn standard() -> Self {
        Self::new()
            .with(LogMirrorsClient)
            .with(JoinedImpliesConnected)
            .with(IdentityMatchesRoom)
            .with(NotificationBound)
    }

    /// [`Self::standard`] plus [`ServerMembership`] and
    /// [`MessageOrderAgreement`], which need every message delivered.
    pub fn quiescent() -> Self {
        Self::standard().with(ServerMembership).with(MessageOrderAgreement)
    }

    /// Register a check.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.checks.push(Box::new(invariant));
    }

    /// Builder form of [`Self::add`].
    #[must_use]
    pub fn with<I: Invariant + 'static>(mut self, invariant: I) -> Self {
        self.add(invariant);
        self
    }

    /// Run every check. `Err` holds one violation per failed check.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let failed: Vec<Violation> =
            self.checks.iter().filter_map(|check| check.check(state).err()).collect();
        if failed.is_empty() { Ok(()) } else { Err(failed) }
    }

    /// [`Self::check_all`] for tests: panics listing every violation.
    #[allow(clippy::panic, reason = "test assertion helper")]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        let Err(failed) = self.check_all(state) else {
            return;
        };
        let lines: Vec<String> = failed.iter().map(ToString::to_string).collect();
        panic!("{} invariant(s) violated {context}:\n  {}", lines.len(), lines.join("\n  "));
    }

    /// Registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
