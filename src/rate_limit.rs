//! Minimum-spacing gate for outbound requests.
//!
//! Every request the client makes passes through one shared [`RateLimiter`].
//! The last dispatch time is held behind an async mutex for the whole
//! check-wait-record sequence, so concurrent callers queue up instead of
//! reading the same stale timestamp and firing together.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// `None` until the first dispatch.
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Wait until a request may be dispatched, then record the dispatch.
    ///
    /// The timestamp is taken when the caller is released, not when its
    /// request completes.
    pub async fn acquire(&self) {
        let mut last = self.last_dispatch.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                log::debug!("RateLimiter: delaying dispatch by {:?}", wait);
                sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}
