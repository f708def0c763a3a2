//! Clock port for time-related operations

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Port for reading the time and waiting.
///
/// Backoff waits go through this port so retry behaviour can be tested
/// without real sleeps.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Waits for `duration` on the calling task.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
