//! Per-origin request pacing.
//!
//! Every request claims the next free slot of its origin before it is sent,
//! so consecutive requests to one site are at least `delay` apart no matter
//! which source or page issued them. Different origins never wait on each
//! other. The clock is tokio's, which makes pacing testable with paused time.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until a request to `url`'s origin may be sent.
    ///
    /// The first request to an origin goes out immediately. Slots are claimed
    /// under the lock and slept on outside it, so concurrent callers for the
    /// same origin queue up `delay` apart.
    pub async fn wait(&self, url: &str) {
        if self.delay.is_zero() {
            return;
        }
        let key = origin_key(url);
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next_slot.get(&key).map_or(now, |&next| next.max(now));
            next_slot.insert(key, slot + self.delay);
            slot
        };
        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            tracing::trace!(url = %url, wait_ms = wait.as_millis() as u64, "Pacing request");
            tokio::time::sleep_until(slot).await;
        }
    }
}

/// `scheme://host:port`, or the raw string when it does not parse.
fn origin_key(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_owned(), |u| u.origin().ascii_serialization())
}
