//! Time source used by the rate limiter and the retry loop.
//!
//! Everything that sleeps or reads the wall clock goes through [`Clock`] so
//! batches can be driven by [`ManualClock`] in tests without real delays.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock time plus a blocking sleep.
pub trait Clock: Send + Sync {
    /// Current time in seconds since the Unix epoch.
    fn now(&self) -> f64;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Shared handle used by every component of a batch.
pub type SharedClock = Arc<dyn Clock>;

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a shared handle to the system clock.
    pub fn shared() -> SharedClock {
        Arc::new(SystemClock)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock: `sleep` advances time instantly and is recorded.
#[derive(Debug, Default)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    // Kept as a Duration so many small sleeps sum exactly.
    now: Duration,
    slept: Vec<Duration>,
}

impl ManualClock {
    /// Create a manual clock starting at `start` seconds.
    pub fn starting_at(start: f64) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ManualState {
                now: Duration::from_secs_f64(start),
                slept: Vec::new(),
            }),
        })
    }

    /// Move time forward without recording a sleep (simulates work).
    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.now += duration;
    }

    /// Total time spent in `sleep` so far.
    pub fn total_slept(&self) -> Duration {
        self.lock().slept.iter().sum()
    }

    /// Every individual sleep, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().slept.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.lock().now.as_secs_f64()
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.now += duration;
        state.slept.push(duration);
    }
}
