use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time source for the collector. All waits go through this so tests can
/// simulate rate-limit windows and backoff without real delays.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time as unix seconds, the unit the rate-limit headers use.
    fn now_epoch(&self) -> u64;

    async fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_epoch(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
