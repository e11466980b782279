use std::time::Duration;

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u128 = 1_000_000_000;
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Turns wall-clock deltas into discrete fall ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredFallTimer")]
pub struct FallTimer {
    #[serde(with = "crate::serde_duration")]
    interval: Duration,
    #[serde(with = "crate::serde_duration")]
    elapsed: Duration,
}

/// Wire form; goes through the same interval floor as [`FallTimer::new`].
#[derive(Deserialize)]
struct StoredFallTimer {
    #[serde(with = "crate::serde_duration")]
    interval: Duration,
    #[serde(with = "crate::serde_duration")]
    elapsed: Duration,
}

impl From<StoredFallTimer> for FallTimer {
    fn from(stored: StoredFallTimer) -> Self {
        Self {
            interval: stored.interval.max(MIN_INTERVAL),
            elapsed: stored.elapsed,
        }
    }
}

impl FallTimer {
    /// A zero interval is bumped to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            elapsed: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Adds `dt` and returns how many ticks became due, saturating at
    /// `u32::MAX`. The remainder carries over to the next call.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        let elapsed = self.elapsed.saturating_add(dt).as_nanos();
        let interval = self.interval.as_nanos().max(1);
        let rem = elapsed % interval;
        self.elapsed = Duration::new(
            (rem / NANOS_PER_SEC) as u64,
            (rem % NANOS_PER_SEC) as u32,
        );
        u32::try_from(elapsed / interval).unwrap_or(u32::MAX)
    }
}
