//! Injected time source.
//!
//! Flap detection and warm-up/graceful-timeout scheduling need a monotonic
//! clock. Routing it through a trait (design note: "callbacks / monkey-patching
//! in tests -> injected collaborators") lets tests drive time deterministically
//! instead of sleeping in real time.

use std::time::{Duration, Instant};

pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests: time only advances when `advance()` is called.
#[derive(Debug, Clone)]
pub struct FakeClock {
    inner: std::sync::Arc<parking_lot::Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: std::sync::Arc::new(parking_lot::Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.inner.lock();
        *guard += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.inner.lock()
    }
}
