//! Fuzz target for the connection lifecycle state machine
//!
//! # Strategy
//!
//! - Arbitrary interleavings of open, connected, dropped, close and ticks
//! - Arbitrary reconnect policies, including zero attempts
//! - Time advanced in jumps from a millisecond to several minutes
//!
//! # Invariants
//!
//! - `open` succeeds exactly when Disconnected
//! - `on_connected` succeeds exactly when Connecting
//! - Connect attempts never exceed the policy's `max_attempts`
//! - A scheduled reconnect is never further out than the capped backoff
//!   plus 25% jitter
//! - After `GiveUp` or `close` nothing is scheduled

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use roomchat_core::{
    env::test_utils::MockEnv, Connection, ConnectionAction, ConnectionConfig, ConnectionState,
    Environment, ReconnectPolicy,
};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Open,
    Connected,
    Dropped,
    Close,
    Advance { millis: u32 },
    Tick,
}

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    initial_backoff_ms: u16,
    max_backoff_ms: u32,
    multiplier: u8,
    max_attempts: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let initial = Duration::from_millis(u64::from(input.initial_backoff_ms));
    let policy = ReconnectPolicy {
        initial_backoff: initial,
        max_backoff: initial.max(Duration::from_millis(u64::from(input.max_backoff_ms % 600_000))),
        multiplier: u32::from(input.multiplier % 8).max(1),
        max_attempts: u32::from(input.max_attempts % 16),
    };
    let max_delay = policy.max_backoff + policy.max_backoff / 4;
    let max_attempts = policy.max_attempts;

    let env = MockEnv::with_seed(input.seed);
    let mut connection = Connection::new(ConnectionConfig::with_reconnect(policy));

    for op in input.ops.into_iter().take(256) {
        let before = connection.state();
        let actions = match op {
            Op::Open => match connection.open(env.now()) {
                Ok(actions) => {
                    assert_eq!(before, ConnectionState::Disconnected);
                    actions
                },
                Err(_) => {
                    assert_ne!(before, ConnectionState::Disconnected);
                    Vec::new()
                },
            },
            Op::Connected => {
                let result = connection.on_connected();
                assert_eq!(result.is_ok(), before == ConnectionState::Connecting);
                Vec::new()
            },
            Op::Dropped => connection.on_disconnected(&env, env.now()),
            Op::Close => {
                let actions = connection.close("fuzz");
                assert!(!connection.is_reconnecting());
                actions
            },
            Op::Advance { millis } => {
                env.advance(Duration::from_millis(u64::from(millis % 300_000)));
                Vec::new()
            },
            Op::Tick => connection.tick(&env, env.now()),
        };

        for action in &actions {
            match action {
                ConnectionAction::Connect { attempt } => assert!(*attempt <= max_attempts),
                ConnectionAction::GiveUp { attempts } => {
                    assert!(*attempts <= max_attempts);
                    assert!(!connection.is_reconnecting());
                    assert_eq!(connection.state(), ConnectionState::Disconnected);
                },
                ConnectionAction::Close { .. } => {},
            }
        }

        assert!(connection.attempt() <= max_attempts);
        if let Some(due) = connection.retry_at() {
            assert_eq!(connection.state(), ConnectionState::Disconnected);
            assert!(due.saturating_duration_since(env.now()) <= max_delay);
        }
    }
});
