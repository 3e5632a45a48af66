//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (time, randomness). Enables
//! deterministic simulation with turmoil (virtual clock, seeded RNG) and
//! production use with real system resources.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// - `now()` never goes backwards within one execution context
/// - given the same seed, `random_bytes()` produces the same sequence
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant type.
    ///
    /// Production uses `std::time::Instant`; simulation uses virtual time
    /// (`tokio::time::Instant` under turmoil).
    type Instant: Copy + Ord + Send + Sync + std::fmt::Debug + std::ops::Sub<Output = Duration>
        + std::ops::Add<Duration, Output = Self::Instant>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time. Only used for display, never for ordering.
    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// Deterministic environment for unit tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    };

    use chrono::{DateTime, Utc};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::Environment;

    /// Manually advanced clock with a seeded ChaCha generator.
    ///
    /// Clones share the clock and the generator state.
    #[derive(Debug, Clone)]
    pub struct MockEnv {
        origin: Instant,
        elapsed_nanos: Arc<AtomicU64>,
        rng: Arc<Mutex<ChaCha8Rng>>,
    }

    impl MockEnv {
        /// Clock at zero, seed 0.
        pub fn new() -> Self {
            Self::with_seed(0)
        }

        /// Clock at zero with the given seed.
        pub fn with_seed(seed: u64) -> Self {
            Self {
                origin: Instant::now(),
                elapsed_nanos: Arc::new(AtomicU64::new(0)),
                rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, duration: Duration) {
            self.elapsed_nanos.fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
        }

        /// Virtual time elapsed since creation.
        pub fn elapsed(&self) -> Duration {
            Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Environment for MockEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn wall_clock(&self) -> DateTime<Utc> {
            let millis = self.elapsed().as_millis() as i64;
            DateTime::from_timestamp_millis(millis).unwrap_or_default()
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            match self.rng.lock() {
                Ok(mut rng) => rng.fill_bytes(buffer),
                Err(poisoned) => poisoned.into_inner().fill_bytes(buffer),
            }
        }
    }

}
