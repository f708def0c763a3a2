//! HTTP client port.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use verikit_domain::{RequestSpec, ResponseSpec};

/// Transport-level failures reported by an [`HttpClient`].
///
/// A response with any status code is not an error here; only failing to
/// obtain a response is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpClientError {
    /// The request did not complete within its timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Underlying message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection failed for another reason.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The connection broke while sending or receiving.
    #[error("transport error: {0}")]
    Transport(String),

    /// Too many redirects were followed.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit.
        max: usize,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Returns true for failures to reach or talk to the server.
    ///
    /// These are the failures a backoff policy retries.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::DnsError { .. }
                | Self::ConnectionRefused { .. }
                | Self::ConnectionFailed(_)
                | Self::Transport(_)
        )
    }
}

/// Port for issuing a single HTTP request.
///
/// Implementations perform exactly one attempt; retries belong to the
/// session that wraps the client.
pub trait HttpClient: Send + Sync {
    /// Sends `request` and returns the full response.
    ///
    /// The request's `timeout` is honoured when set.
    fn execute(
        &self,
        request: &RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + '_>>;
}
