//! Backoff policy shared by every request issued through a session.
//!
//! The policy is pure configuration: how many attempts a request gets,
//! how long to wait between them, and which status codes count as
//! transient. It never performs I/O itself.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Status codes retried by default (rate limiting and gateway failures).
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Upper bound applied to any computed backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Retry and backoff configuration.
///
/// Immutable once constructed. The delay before retry `n` (zero-based) is
/// `backoff_factor * 2^n` seconds, capped at [`MAX_BACKOFF`], so delays never
/// decrease as attempts accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    max_attempts: u32,
    backoff_factor: f64,
    retryable_status_codes: BTreeSet<u16>,
}

impl BackoffPolicy {
    /// Creates a policy.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPolicy`] if `max_attempts` is zero or
    /// `backoff_factor` is negative or not finite.
    pub fn new(
        max_attempts: u32,
        backoff_factor: f64,
        retryable_status_codes: impl IntoIterator<Item = u16>,
    ) -> DomainResult<Self> {
        if max_attempts == 0 {
            return Err(DomainError::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !backoff_factor.is_finite() || backoff_factor < 0.0 {
            return Err(DomainError::InvalidPolicy(format!(
                "backoff_factor must be a non-negative number, got {backoff_factor}"
            )));
        }

        Ok(Self {
            max_attempts,
            backoff_factor,
            retryable_status_codes: retryable_status_codes.into_iter().collect(),
        })
    }

    /// Policy with the default retryable status codes and a factor of one second.
    ///
    /// `max_retries` counts retries after the first attempt, so the policy
    /// allows `max_retries + 1` attempts in total.
    #[must_use]
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            backoff_factor: 1.0,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect(),
        }
    }

    /// Policy that performs exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::with_retries(0)
    }

    /// Returns the total number of attempts, including the first one.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff factor in seconds.
    #[must_use]
    pub const fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Returns the set of status codes that trigger a retry.
    #[must_use]
    pub const fn retryable_status_codes(&self) -> &BTreeSet<u16> {
        &self.retryable_status_codes
    }

    /// Returns true if a response with this status should be retried.
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    /// Returns true if another attempt is allowed after `attempts_made` attempts.
    #[must_use]
    pub const fn allows_another_attempt(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Delay to wait after `attempts_made` failed attempts, before the next one.
    ///
    /// `attempts_made` is one-based: the wait between attempt 1 and 2 is
    /// `delay_after(1)`. Returns [`Duration::ZERO`] for `attempts_made == 0`.
    #[must_use]
    pub fn delay_after(&self, attempts_made: u32) -> Duration {
        if attempts_made == 0 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempts_made - 1).unwrap_or(i32::MAX);
        let seconds = self.backoff_factor * 2f64.powi(exponent);
        if !seconds.is_finite() || seconds >= MAX_BACKOFF.as_secs_f64() {
            return MAX_BACKOFF;
        }
        Duration::from_secs_f64(seconds)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::with_retries(1)
    }
}
