//! Time source abstraction for TTL bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Source of "now" for cache timestamps.
///
/// Backoff sleeps still go through `tokio::time`, so tests that need both
/// should pause the tokio clock as well.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Clock backed by the tokio runtime clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_only_moves_on_advance() {
        let clock = ManualClock::new();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(30));
        assert_eq!(clock.now() - start, Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_follows_paused_runtime() {
        let clock = SystemClock;
        let start = clock.now();
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(clock.now() - start >= Duration::from_millis(500));
    }
}
