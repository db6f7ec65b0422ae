//! Monotonic time source injected into the control loop and drivers.
//!
//! - `MonotonicClock` - Wall clock backed by `Instant`, sleeps for real
//! - `VirtualClock` - Shared counter advanced only by `sleep()` / `advance()`
//!
//! The control loop never calls `Instant::now()` directly, so timing-sensitive
//! paths (debounce waits, speed intervals, sampling timestamps) can be driven
//! deterministically from tests and from the simulation driver.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Suspend the calling thread of control for `duration`.
    fn sleep(&self, duration: Duration);

    /// Seconds elapsed since the clock's origin.
    #[inline]
    fn now_secs(&self) -> f64 {
        self.now().as_secs_f64()
    }
}

/// Wall clock with its origin at construction time.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Virtual clock; clones share the same time.
///
/// Time only moves when someone sleeps on it or advances it, which makes
/// simulated runs complete as fast as the CPU allows.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    nanos: Arc<AtomicU64>,
}

impl VirtualClock {
    /// Create a clock at t = 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let step = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(step, Ordering::SeqCst);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
