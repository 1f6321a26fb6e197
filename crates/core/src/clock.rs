// SPDX-License-Identifier: MIT

//! Clock abstraction for testable time handling.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A clock that provides the current wall time, in whole and fractional
/// seconds since the Unix epoch. Everything in this crate reasons about
/// wall time (`now - last_seen`, `lease_until`, …) rather than `Instant`,
/// since peer state is compared across process boundaries.
pub trait Clock: Send + Sync + 'static {
    /// Seconds since the Unix epoch, as an `f64` so sub-second leases and
    /// jitter remain representable.
    fn now_secs(&self) -> f64;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

/// Fake clock for deterministic unit tests.
#[derive(Clone)]
pub struct FakeClock {
    secs: Arc<Mutex<f64>>,
}

impl FakeClock {
    pub fn new(start_secs: f64) -> Self {
        Self { secs: Arc::new(Mutex::new(start_secs)) }
    }

    pub fn advance(&self, duration: Duration) {
        *self.secs.lock() += duration.as_secs_f64();
    }

    pub fn set(&self, secs: f64) {
        *self.secs.lock() = secs;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(1_000_000.0)
    }
}

impl Clock for FakeClock {
    fn now_secs(&self) -> f64 {
        *self.secs.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
