//! Global politeness pacing
//!
//! Every request to the crawled site, from any worker, passes through one
//! [`RateLimiter`]. The limiter keeps the time of the last dispatch behind an
//! async mutex that stays locked while the caller sleeps out the remaining
//! interval, so reading the last dispatch time, waiting and recording the new
//! dispatch time form one critical section. Waiters are served in FIFO order.

use crate::robots::RobotsPolicy;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between consecutive requests across all workers
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter enforcing `interval` between dispatches
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// The enforced spacing
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the caller may dispatch a request
    ///
    /// Returns once at least `interval` has elapsed since the previous
    /// dispatch by any worker, and records the returned instant as the new
    /// last dispatch time.
    pub async fn await_turn(&self) -> Instant {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                tracing::trace!(
                    "Pacing for {:?}",
                    ready_at.saturating_duration_since(Instant::now())
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        now
    }
}

/// Calculates the effective politeness interval
///
/// This takes the maximum of the configured interval and the robots.txt
/// crawl delay for the crawler's user agent, if one is declared.
pub fn effective_interval(configured: Duration, robots: &RobotsPolicy) -> Duration {
    match robots.crawl_delay() {
        Some(delay) => std::cmp::max(configured, delay),
        None => configured,
    }
}
