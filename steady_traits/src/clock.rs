use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock abstraction for sampling and dwell timing across the stack.
///
/// - now(): returns a monotonic Instant
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - ms_since(): helper to compute elapsed milliseconds from an epoch Instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis().min(u128::from(u64::MAX)) as u64
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Manually driven clock for replaying recorded traces and for tests.
///
/// now() = origin + offset
/// sleep(d) advances internal time by d without actually sleeping.
/// Clones share the same offset, so a clone handed to a monitor can be
/// driven from the outside.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    /// Set the absolute offset relative to origin.
    ///
    /// Moving backwards is allowed; consumers measuring with `ms_since`
    /// see the saturated (zero) difference.
    pub fn set_offset(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = d;
        }
    }

    /// Convenience for traces recorded in milliseconds.
    pub fn set_ms(&self, ms: u64) {
        self.set_offset(Duration::from_millis(ms));
    }

    pub fn offset(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_without_sleeping() {
        let clock = ManualClock::new();
        let epoch = clock.now();
        clock.sleep(Duration::from_millis(1500));
        assert_eq!(clock.ms_since(epoch), 1500);
        clock.set_ms(250);
        assert_eq!(clock.ms_since(epoch), 250);
    }

    #[test]
    fn ms_since_saturates_when_epoch_is_in_the_future() {
        let clock = ManualClock::new();
        clock.set_ms(1000);
        let epoch = clock.now();
        clock.set_ms(0);
        assert_eq!(clock.ms_since(epoch), 0);
    }

    #[test]
    fn clones_share_the_offset() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(Duration::from_secs(2));
        assert_eq!(b.offset(), Duration::from_secs(2));
    }
}
