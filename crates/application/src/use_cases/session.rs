//! Resilient session use case.
//!
//! Wraps an [`HttpClient`] so that every request gets the same retry,
//! backoff and default-timeout treatment.

use std::time::Duration;

use tracing::{debug, warn};
use verikit_domain::{BackoffPolicy, HarnessConfig, RequestSpec, ResponseSpec};

use crate::error::ApplicationError;
use crate::ports::{Clock, HttpClient, HttpClientError};

/// Final outcome of a request issued through a [`ResilientSession`].
///
/// Retry exhaustion is a regular value: `result` holds the last response
/// received (whatever its status) or the last transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    /// URL that was requested.
    pub url: String,
    /// Attempts made, including the first one.
    pub attempts: u32,
    /// Last response or last error.
    pub result: Result<ResponseSpec, HttpClientError>,
}

impl RequestOutcome {
    /// Returns the response, if one was received.
    #[must_use]
    pub fn response(&self) -> Option<&ResponseSpec> {
        self.result.as_ref().ok()
    }

    /// Returns the final status code, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }

    /// Converts into a `Result`, attaching the URL and attempt count to errors.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::RequestFailed`] if no response was received.
    pub fn into_result(self) -> Result<ResponseSpec, ApplicationError> {
        self.result.map_err(|source| ApplicationError::RequestFailed {
            url: self.url,
            attempts: self.attempts,
            source,
        })
    }
}

/// HTTP session applying a [`BackoffPolicy`] to every request.
///
/// Configuration is immutable after construction, so one session can be
/// shared by every test of a run.
pub struct ResilientSession<H: HttpClient, C: Clock> {
    client: H,
    clock: C,
    policy: BackoffPolicy,
    default_timeout: Duration,
}

impl<H: HttpClient, C: Clock> ResilientSession<H, C> {
    /// Creates a session.
    #[must_use]
    pub const fn new(client: H, clock: C, policy: BackoffPolicy, default_timeout: Duration) -> Self {
        Self {
            client,
            clock,
            policy,
            default_timeout,
        }
    }

    /// Creates a session using the policy and timeout from `config`.
    #[must_use]
    pub fn from_config(client: H, clock: C, config: &HarnessConfig) -> Self {
        Self::new(client, clock, config.backoff_policy(), config.request_timeout)
    }

    /// Returns the backoff policy.
    #[must_use]
    pub const fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Returns the timeout applied to requests that do not set one.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }

    /// Returns the session clock.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Issues `request`, retrying connection errors and retryable statuses.
    ///
    /// Attempts are sequential; between attempts the session waits for the
    /// policy's backoff delay on the calling task.
    pub async fn execute(&self, request: &RequestSpec) -> RequestOutcome {
        let mut request = request.clone();
        request.timeout = Some(request.timeout_or(self.default_timeout));

        let mut attempts = 0;
        loop {
            attempts += 1;
            debug!(method = %request.method, url = %request.url, attempt = attempts, "sending request");

            let result = self.client.execute(&request).await;
            let retry_reason = match &result {
                Ok(response) if self.policy.is_retryable_status(response.status) => {
                    Some(format!("status {}", response.status))
                }
                Err(error) if error.is_connection_error() => Some(error.to_string()),
                _ => None,
            };

            match retry_reason {
                Some(reason) if self.policy.allows_another_attempt(attempts) => {
                    let delay = self.policy.delay_after(attempts);
                    warn!(
                        url = %request.url,
                        attempt = attempts,
                        max_attempts = self.policy.max_attempts(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "retrying after {reason}"
                    );
                    self.clock.sleep(delay).await;
                }
                _ => {
                    return RequestOutcome {
                        url: request.url,
                        attempts,
                        result,
                    };
                }
            }
        }
    }

    /// Issues a GET request to `url` with the default timeout.
    pub async fn get(&self, url: &str) -> RequestOutcome {
        self.execute(&RequestSpec::get(url)).await
    }
}
