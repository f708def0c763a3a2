//! Tokio-backed clock adapter

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use verikit_application::ports::Clock;

/// Clock using the system time and `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    /// Creates a new clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_epoch() {
        assert!(TokioClock::new().now().timestamp() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_waits_for_duration() {
        let start = tokio::time::Instant::now();
        TokioClock::new().sleep(Duration::from_secs(2)).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
