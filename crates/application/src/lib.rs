//! Verikit Application - Session and probe orchestration
//!
//! Defines the ports to the outside world (HTTP, time) and the use cases
//! built on them: the resilient session and the readiness probe.

pub mod error;
pub mod ports;
pub mod use_cases;

pub use error::{ApplicationError, ApplicationResult};
pub use use_cases::{
    DEFAULT_PROBE_TIMEOUT, ReadinessProber, ReadinessReport, RequestOutcome, ResilientSession,
    ServiceStatus,
};
