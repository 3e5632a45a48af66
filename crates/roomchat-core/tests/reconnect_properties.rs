//! Properties of the reconnect schedule.
//!
//! These tests verify:
//! - Un-jittered delays grow by the multiplier and are capped
//! - Jitter never exceeds a quarter of the base delay
//! - A connection that never succeeds gives up after exactly `max_attempts`

use std::time::{Duration, Instant};

use proptest::prelude::*;
use roomchat_core::{
    Connection, ConnectionAction, ConnectionConfig, ConnectionState, Environment, ReconnectPolicy,
};

/// Environment whose entropy is a fixed value.
#[derive(Clone)]
struct FixedEntropy(u64);

impl Environment for FixedEntropy {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let bytes = self.0.to_be_bytes();
        for (dst, src) in buffer.iter_mut().zip(bytes.iter().cycle()) {
            *dst = *src;
        }
    }
}

fn policy(initial_ms: u64, max_ms: u64, multiplier: u32, max_attempts: u32) -> ReconnectPolicy {
    ReconnectPolicy {
        initial_backoff: Duration::from_millis(initial_ms),
        max_backoff: Duration::from_millis(max_ms),
        multiplier,
        max_attempts,
    }
}

fn base_delay(policy: &ReconnectPolicy, attempt: u32) -> Duration {
    policy.delay(attempt, 0)
}

proptest! {
    #[test]
    fn prop_delay_monotonic_and_capped(
        initial_ms in 1u64..2_000,
        max_ms in 2_000u64..120_000,
        multiplier in 1u32..5,
        attempt in 0u32..40,
    ) {
        let policy = policy(initial_ms, max_ms, multiplier, 8);

        let current = base_delay(&policy, attempt);
        let next = base_delay(&policy, attempt + 1);

        prop_assert!(next >= current);
        prop_assert!(current <= policy.max_backoff);
    }

    #[test]
    fn prop_jitter_at_most_quarter(
        initial_ms in 1u64..2_000,
        attempt in 0u32..10,
        entropy in any::<u64>(),
    ) {
        let policy = policy(initial_ms, 30_000, 2, 8);

        let base = base_delay(&policy, attempt);
        let jittered = policy.delay(attempt, entropy);

        prop_assert!(jittered >= base);
        prop_assert!(jittered <= base + base / 4);
    }

    #[test]
    fn prop_gives_up_after_max_attempts(max_attempts in 0u32..12, entropy in any::<u64>()) {
        let env = FixedEntropy(entropy);
        let mut now = Instant::now();
        let config = ConnectionConfig::with_reconnect(policy(100, 5_000, 2, max_attempts));
        let mut conn: Connection = Connection::new(config);
        conn.open(now).unwrap();

        let mut connects = 0u32;
        let gave_up = loop {
            let actions = conn.on_disconnected(&env, now);
            if let Some(ConnectionAction::GiveUp { attempts }) = actions.first() {
                break *attempts;
            }
            now = conn
                .retry_at()
                .ok_or_else(|| TestCaseError::fail("reconnect neither scheduled nor abandoned"))?;
            let actions = conn.tick(&env, now);
            prop_assert_eq!(actions, vec![ConnectionAction::Connect { attempt: connects + 1 }]);
            connects += 1;
        };

        prop_assert_eq!(gave_up, max_attempts);
        prop_assert_eq!(connects, max_attempts);
        prop_assert_eq!(conn.state(), ConnectionState::Disconnected);
    }
}

#[test]
fn doubling_sequence_with_default_policy() {
    let policy = ReconnectPolicy::default();
    let delays: Vec<_> = (0..8).map(|attempt| base_delay(&policy, attempt).as_millis()).collect();
    assert_eq!(delays, [500, 1_000, 2_000, 4_000, 8_000, 16_000, 30_000, 30_000]);
}
