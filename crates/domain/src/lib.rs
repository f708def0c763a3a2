//! Verikit Domain - Core verification types
//!
//! This crate defines the domain model for verifying HTTP and
//! server-sent-event responses from the service under test.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod request;
pub mod response;
pub mod retry;
pub mod schema;
pub mod settings;
pub mod sse;
pub mod testing;

pub use error::{DomainError, DomainResult};
pub use request::{HttpMethod, RequestHeader, RequestSpec};
pub use response::{BodyText, ResponseSpec};
pub use retry::{BackoffPolicy, DEFAULT_RETRYABLE_STATUS_CODES, MAX_BACKOFF};
pub use schema::{RecordSchema, SchemaViolation};
pub use settings::{Endpoint, HarnessConfig, ServiceDescriptor};
pub use sse::{Aggregation, SseChunk, SseLine, aggregate, aggregate_text, data_lines};
pub use testing::{
    Assertion, AssertionResult, MatchSource, StatusExpectation, TestResults, TestSuite,
    ValidationFailure, excerpt,
};
