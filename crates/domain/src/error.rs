//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A configuration value could not be interpreted.
    #[error("invalid configuration for {key}: {message}")]
    InvalidConfig {
        /// Name of the offending setting (usually the environment variable).
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// A backoff policy was constructed with out-of-range values.
    #[error("invalid backoff policy: {0}")]
    InvalidPolicy(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
