use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Fixed-period ticker that can be cancelled while waiting
///
/// Ticks are spaced `period` apart, start to start. When a tick's work takes
/// longer than `period`, the next tick fires right away and the schedule
/// restarts from there: missed ticks are neither replayed nor skipped.
pub struct Ticker {
    interval: Interval,
    cancel: CancellationToken,
}

impl Ticker {
    pub fn new(period: Duration, cancel: CancellationToken) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { interval, cancel }
    }

    /// Wait for the next tick. The first tick fires immediately.
    ///
    /// Returns the tick start, or `None` once cancelled.
    pub async fn tick(&mut self) -> Option<Instant> {
        if self.cancel.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            _ = self.interval.tick() => Some(Instant::now()),
        }
    }
}
