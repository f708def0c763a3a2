//! Application error types

use thiserror::Error;
use verikit_domain::{DomainError, ValidationFailure};

use crate::ports::HttpClientError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A request still failed after the session exhausted its attempts.
    #[error("request to {url} failed after {attempts} attempt(s): {source}")]
    RequestFailed {
        /// Target URL.
        url: String,
        /// Attempts made.
        attempts: u32,
        /// Last transport error.
        #[source]
        source: HttpClientError,
    },

    /// The HTTP client could not be set up.
    #[error("http client error: {0}")]
    Client(#[from] HttpClientError),

    /// A required service could not be reached before the run started.
    #[error("{service} is not running at {url}: {reason}")]
    EnvironmentUnavailable {
        /// Display name of the service.
        service: String,
        /// Probed URL.
        url: String,
        /// Why the probe failed.
        reason: String,
    },

    /// A response check failed.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
