//! Time source seam for the countdown loop.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Monotonic and wall-clock time plus cooperative sleeping.
///
/// The negotiator never reads the system clock directly, so tests drive the
/// countdown deterministically with a manual clock.
pub trait Clock {
    /// Monotonic instant for countdown arithmetic.
    fn now(&self) -> Instant;

    /// Wall-clock time for deferral deadline checks.
    fn wall_now(&self) -> DateTime<Utc>;

    /// Yield until roughly `duration` has elapsed.
    fn sleep(&self, duration: Duration);
}

/// Production clock over the OS time sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
