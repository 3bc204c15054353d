//! Sleeper port - how the runner waits out a backoff delay.
//!
//! Production uses `TokioSleeper`, a cooperative suspension point. Tests
//! swap in a sleeper that records the requested delays and returns at once,
//! so exact backoff values can be asserted without waiting for them.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokio_sleeper_waits_at_least_the_delay() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
