//! Application use cases.

mod readiness;
mod session;

pub use readiness::{DEFAULT_PROBE_TIMEOUT, ReadinessProber, ReadinessReport, ServiceStatus};
pub use session::{RequestOutcome, ResilientSession};
