//! Readiness probe use case.
//!
//! Runs once before any functional check. Every service must answer the
//! probe with some HTTP response; the status code itself is not judged.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info};
use verikit_domain::{RequestSpec, ServiceDescriptor};

use super::session::ResilientSession;
use crate::error::ApplicationError;
use crate::ports::{Clock, HttpClient};

/// Timeout of a single probe request.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe result for one reachable service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    /// The probed service.
    pub service: ServiceDescriptor,
    /// Status code returned by the probe.
    pub status: u16,
    /// Attempts the session needed.
    pub attempts: u32,
}

/// Report of a successful readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessReport {
    /// One entry per service, in probe order.
    pub services: Vec<ServiceStatus>,
    /// When the probe finished.
    pub checked_at: DateTime<Utc>,
}

/// Checks that a list of services is reachable.
pub struct ReadinessProber<'a, H: HttpClient, C: Clock> {
    session: &'a ResilientSession<H, C>,
    timeout: Duration,
}

impl<'a, H: HttpClient, C: Clock> ReadinessProber<'a, H, C> {
    /// Creates a prober using [`DEFAULT_PROBE_TIMEOUT`].
    #[must_use]
    pub const fn new(session: &'a ResilientSession<H, C>) -> Self {
        Self {
            session,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Overrides the probe timeout (builder pattern).
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probes `services` in order and stops at the first unreachable one.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::EnvironmentUnavailable`] naming the first
    /// service whose probe did not produce a response.
    pub async fn probe(
        &self,
        services: &[ServiceDescriptor],
    ) -> Result<ReadinessReport, ApplicationError> {
        let mut statuses = Vec::with_capacity(services.len());

        for service in services {
            let request = RequestSpec::get(&service.base_url).with_timeout(self.timeout);
            let outcome = self.session.execute(&request).await;
            let name = service.display_name();

            match outcome.result {
                Ok(response) => {
                    info!(
                        status = response.status,
                        "{name} is running at {}", service.base_url
                    );
                    statuses.push(ServiceStatus {
                        service: service.clone(),
                        status: response.status,
                        attempts: outcome.attempts,
                    });
                }
                Err(err) => {
                    error!("{name} is not running at {}: {err}", service.base_url);
                    return Err(ApplicationError::EnvironmentUnavailable {
                        service: name,
                        url: service.base_url.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(ReadinessReport {
            services: statuses,
            checked_at: self.session.clock().now(),
        })
    }
}
