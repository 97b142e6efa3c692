//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "03-playback"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Wall clocks consulted by the playback engine."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic source of real elapsed time. Read once per playback tick.
pub trait PlaybackClock: Send + fmt::Debug {
    fn now(&self) -> Duration;
}

/// Process monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(by);
    }

    pub fn advance_secs(&self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.advance(Duration::from_secs_f64(seconds));
        }
    }

    pub fn set(&self, to: Duration) {
        *self.now.lock() = to;
    }
}

impl PlaybackClock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance_secs(2.5);
        handle.advance_secs(-1.0);
        assert_eq!(clock.now(), Duration::from_millis(2_500));
        clock.set(Duration::ZERO);
        assert_eq!(handle.now(), Duration::ZERO);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
