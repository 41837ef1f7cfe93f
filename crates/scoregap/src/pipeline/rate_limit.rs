use std::time::{Duration, Instant};

use tracing::trace;

/// Keeps at least `interval` between consecutive remote calls.
///
/// Spacing is measured from the previous call, so the first call of a run
/// goes out at once. Time spent fetching and writing counts toward the gap.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until the next call is allowed, then marks it as made.
    pub fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let remaining = self.interval - elapsed;
                trace!(remaining_ms = remaining.as_millis() as u64, "Rate limit wait");
                std::thread::sleep(remaining);
            }
        }
        self.last_call = Some(Instant::now());
    }
}
