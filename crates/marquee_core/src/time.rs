//! Frame clock
//!
//! Every animation and cache timestamp in Marquee is a [`Duration`] measured
//! from the clock's epoch. The host supplies the clock once at startup and
//! hands clones of the [`ClockHandle`] to whoever needs "now".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's epoch
    fn now(&self) -> Duration;
}

/// Shared handle to the host clock
pub type ClockHandle = Arc<dyn Clock>;

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Create a shareable handle
    pub fn handle() -> ClockHandle {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Manually advanced clock
///
/// Used for deterministic replays and tests. Clones share the same time.
///
/// ```
/// use marquee_core::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// clock.advance_ms(250);
/// assert_eq!(clock.now(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle sharing this clock's time
    pub fn handle(&self) -> ClockHandle {
        Arc::new(self.clone())
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Duration) {
        self.micros.store(now.as_micros() as u64, Ordering::Release);
    }

    pub fn set_ms(&self, ms: u64) {
        self.set(Duration::from_millis(ms));
    }

    /// Move time forward
    pub fn advance(&self, delta: Duration) {
        self.micros
            .fetch_add(delta.as_micros() as u64, Ordering::AcqRel);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_handles() {
        let clock = ManualClock::new();
        let handle = clock.handle();

        clock.advance_ms(16);
        assert_eq!(handle.now(), Duration::from_millis(16));

        clock.set_ms(1000);
        assert_eq!(handle.now(), Duration::from_secs(1));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
