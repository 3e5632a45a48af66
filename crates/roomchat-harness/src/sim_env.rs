//! Simulation environment for turmoil.
//!
//! `SimEnv` uses tokio's clock, which turmoil drives virtually, and a
//! seeded ChaCha generator so reconnect jitter is reproducible.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use roomchat_core::Environment;

/// Wall-clock origin for simulated timestamps (2024-01-01T00:00:00Z).
const WALL_CLOCK_ORIGIN_SECS: i64 = 1_704_067_200;

/// Deterministic environment for simulation.
///
/// Clones share the generator, so all components seeded from one `SimEnv`
/// draw from a single reproducible sequence.
#[derive(Clone)]
pub struct SimEnv {
    origin: tokio::time::Instant,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Create an environment with seed 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Create an environment with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            origin: tokio::time::Instant::now(),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        let elapsed = self.now().saturating_duration_since(self.origin);
        let origin = DateTime::from_timestamp(WALL_CLOCK_ORIGIN_SECS, 0).unwrap_or_default();
        let offset = ChronoDuration::milliseconds(elapsed.as_millis() as i64);
        origin + offset
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        match self.rng.lock() {
            Ok(mut rng) => rng.fill_bytes(buffer),
            Err(poisoned) => poisoned.into_inner().fill_bytes(buffer),
        }
    }
}
