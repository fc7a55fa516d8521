use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Single-slot cache whose value is fresh for `ttl` after it was stored.
///
/// Stale values are kept so callers can fall back to them when a refresh
/// fails.
#[derive(Clone)]
pub struct TtlCache<T> {
    ttl: Duration,
    slot: Arc<Mutex<Option<(Instant, T)>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// The cached value if it was stored less than `ttl` before `now`.
    pub async fn get_fresh_at(&self, now: Instant) -> Option<T> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .filter(|(stored_at, _)| now.saturating_duration_since(*stored_at) < self.ttl)
            .map(|(_, value)| value.clone())
    }

    pub async fn get_fresh(&self) -> Option<T> {
        self.get_fresh_at(Instant::now()).await
    }

    /// The cached value regardless of age.
    pub async fn get_any(&self) -> Option<T> {
        self.slot.lock().await.as_ref().map(|(_, value)| value.clone())
    }

    pub async fn put_at(&self, value: T, now: Instant) {
        *self.slot.lock().await = Some((now, value));
    }

    pub async fn put(&self, value: T) {
        self.put_at(value, Instant::now()).await;
    }
}
