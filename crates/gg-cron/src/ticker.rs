use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::time::Duration;

/// Time source for the scheduler
#[async_trait]
pub trait Ticker: Send + Sync {
    /// Wait for `duration`, then return the local wall-clock time
    async fn after(&self, duration: Duration) -> NaiveDateTime;
}

/// Ticker backed by tokio timers and the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTicker;

#[async_trait]
impl Ticker for SystemTicker {
    async fn after(&self, duration: Duration) -> NaiveDateTime {
        tokio::time::sleep(duration).await;
        Local::now().naive_local()
    }
}
