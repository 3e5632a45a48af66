//! Connection lifecycle state machine.
//!
//! Tracks whether a transport is up, enforces the connect timeout, and
//! schedules reconnects with bounded exponential backoff. Uses the action
//! pattern: methods take time as input and return actions for the driver to
//! execute. The state machine never creates transports itself.
//!
//! # State Machine
//!
//! ```text
//!                 open                     on_connected
//! ┌──────────────┐ ───────> ┌────────────┐ ───────────> ┌───────────┐
//! │ Disconnected │          │ Connecting │              │ Connected │
//! └──────────────┘ <─────── └────────────┘ <─────────── └───────────┘
//!        │  ^   timeout / on_disconnected      │     on_disconnected
//!        │  │                                  │
//!        │  └──── backoff expires (tick) ──────┘
//!        │
//!        └── close: no reconnect
//! ```
//!
//! # Invariants
//!
//! - A reconnect is scheduled only after an unplanned drop, never after
//!   [`Connection::close`].
//! - Consecutive failed reconnect attempts never exceed
//!   [`ReconnectPolicy::max_attempts`]; the counter resets on success.

use std::{
    ops::{Add, Sub},
    time::{Duration, Instant},
};

use crate::{env::Environment, error::ConnectionError};

/// Time allowed for a transport to signal connected.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay before the first reconnect attempt.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Upper bound on the reconnect delay, before jitter.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Consecutive reconnect attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Create a new transport instance and connect it
    Connect {
        /// Reconnect attempt number, 0 for the initial connect
        attempt: u32,
    },

    /// Discard the current transport instance
    Close {
        /// Reason for closing the transport
        reason: String,
    },

    /// Reconnect attempts exhausted; the connection stays down
    GiveUp {
        /// Attempts made since the last successful connect
        attempts: u32,
    },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No transport, possibly waiting for a reconnect
    Disconnected,
    /// Transport created, waiting for it to signal connected
    Connecting,
    /// Transport up
    Connected,
}

/// Reconnect backoff policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect
    pub initial_backoff: Duration,
    /// Cap on the un-jittered delay
    pub max_backoff: Duration,
    /// Growth factor per attempt
    pub multiplier: u32,
    /// Consecutive attempts before giving up. Zero disables reconnects.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            multiplier: 2,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Policy that never reconnects.
    pub fn disabled() -> Self {
        Self { max_attempts: 0, ..Self::default() }
    }

    /// Delay before reconnect attempt number `attempt` (0-based).
    ///
    /// `min(initial * multiplier^attempt, max)` plus up to 25% jitter drawn
    /// from `entropy`.
    pub fn delay(&self, attempt: u32, entropy: u64) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        let base = self.initial_backoff.saturating_mul(factor).min(self.max_backoff);

        let spread = (base / 4).as_nanos() as u64;
        let jitter = if spread == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(entropy % spread.saturating_add(1))
        };

        base.saturating_add(jitter)
    }
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Timeout for a transport to signal connected
    pub connect_timeout: Duration,
    /// Reconnect policy after unplanned drops
    pub reconnect: ReconnectPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::with_reconnect(ReconnectPolicy::default())
    }
}

impl ConnectionConfig {
    /// Defaults with the given reconnect policy.
    pub fn with_reconnect(reconnect: ReconnectPolicy) -> Self {
        Self { connect_timeout: DEFAULT_CONNECT_TIMEOUT, reconnect }
    }
}

/// Connection lifecycle state machine.
///
/// Pure: no I/O, no Environment storage. Time is passed to the methods that
/// need it and randomness (jitter) is drawn from the environment argument.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct Connection<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = I>,
{
    state: ConnectionState,
    config: ConnectionConfig,
    /// Reconnect attempts since the last successful connect
    attempt: u32,
    /// When the current transport was requested
    connecting_since: Option<I>,
    /// When the next reconnect is due
    retry_at: Option<I>,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = I>,
{
    /// Create a connection in [`ConnectionState::Disconnected`] with nothing
    /// scheduled.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            config,
            attempt: 0,
            connecting_since: None,
            retry_at: None,
        }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts since the last successful connect.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// When the next reconnect fires. `None` if none is scheduled.
    #[must_use]
    pub fn retry_at(&self) -> Option<I> {
        self.retry_at
    }

    /// Whether a reconnect is scheduled.
    #[must_use]
    pub fn is_reconnecting(&self) -> bool {
        self.retry_at.is_some()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Start the initial connect (user intent).
    ///
    /// Cancels any scheduled reconnect and resets the attempt counter.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not Disconnected
    pub fn open(&mut self, now: I) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Disconnected {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "open".to_string(),
            });
        }

        self.attempt = 0;
        self.retry_at = None;
        self.state = ConnectionState::Connecting;
        self.connecting_since = Some(now);

        Ok(vec![ConnectionAction::Connect { attempt: 0 }])
    }

    /// The transport signalled connected.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not Connecting
    pub fn on_connected(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "on_connected".to_string(),
            });
        }

        self.state = ConnectionState::Connected;
        self.attempt = 0;
        self.connecting_since = None;
        Ok(())
    }

    /// The transport dropped or failed (unplanned).
    ///
    /// Schedules a reconnect, or gives up once the policy is exhausted.
    /// Ignored when already Disconnected: a late signal from a transport
    /// that was already discarded must not schedule a second reconnect.
    pub fn on_disconnected<E: Environment>(&mut self, env: &E, now: I) -> Vec<ConnectionAction> {
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }

        self.state = ConnectionState::Disconnected;
        self.connecting_since = None;
        self.schedule_reconnect(env, now)
    }

    /// User shutdown. No reconnect is scheduled.
    ///
    /// Returns `Close` if a transport was live or being created.
    pub fn close(&mut self, reason: impl Into<String>) -> Vec<ConnectionAction> {
        let had_transport = self.state != ConnectionState::Disconnected;

        self.state = ConnectionState::Disconnected;
        self.connecting_since = None;
        self.retry_at = None;
        self.attempt = 0;

        if had_transport {
            vec![ConnectionAction::Close { reason: reason.into() }]
        } else {
            Vec::new()
        }
    }

    /// Elapsed time since the transport was requested, if the connect
    /// timeout is exceeded. `None` otherwise.
    #[must_use]
    pub fn check_timeout(&self, now: I) -> Option<Duration> {
        if self.state != ConnectionState::Connecting {
            return None;
        }
        let elapsed = now - self.connecting_since?;
        if elapsed > self.config.connect_timeout { Some(elapsed) } else { None }
    }

    /// Process periodic maintenance: connect timeout and reconnect expiry.
    pub fn tick<E: Environment>(&mut self, env: &E, now: I) -> Vec<ConnectionAction> {
        if let Some(elapsed) = self.check_timeout(now) {
            let error = ConnectionError::ConnectTimeout { elapsed };
            self.state = ConnectionState::Disconnected;
            self.connecting_since = None;

            let mut actions = vec![ConnectionAction::Close { reason: error.to_string() }];
            actions.extend(self.schedule_reconnect(env, now));
            return actions;
        }

        match self.retry_at {
            Some(due) if now >= due => {
                self.retry_at = None;
                self.attempt = self.attempt.saturating_add(1);
                self.state = ConnectionState::Connecting;
                self.connecting_since = Some(now);
                vec![ConnectionAction::Connect { attempt: self.attempt }]
            },
            _ => Vec::new(),
        }
    }

    fn schedule_reconnect<E: Environment>(&mut self, env: &E, now: I) -> Vec<ConnectionAction> {
        let policy = &self.config.reconnect;
        if self.attempt >= policy.max_attempts {
            self.retry_at = None;
            let attempts = self.attempt;
            self.attempt = 0;
            return vec![ConnectionAction::GiveUp { attempts }];
        }

        let delay = policy.delay(self.attempt, env.random_u64());
        self.retry_at = Some(now + delay);
        Vec::new()
    }
}
