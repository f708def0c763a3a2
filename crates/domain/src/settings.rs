//! Harness configuration.
//!
//! Built once at process start and passed by value into the session and
//! the readiness prober. Every field can be overridden through an
//! environment variable; [`HarnessConfig::from_lookup`] takes the lookup
//! function so tests never touch the real environment.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};
use crate::retry::BackoffPolicy;

/// Environment variable overriding [`HarnessConfig::frontend_url`].
pub const ENV_FRONTEND_URL: &str = "TEST_FRONTEND_URL";
/// Environment variable overriding [`HarnessConfig::backend_url`].
pub const ENV_BACKEND_URL: &str = "TEST_BACKEND_URL";
/// Environment variable overriding [`HarnessConfig::llamastack_url`].
pub const ENV_LLAMASTACK_URL: &str = "TEST_LLAMASTACK_URL";
/// Environment variable overriding the request timeout, in seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "TEST_REQUEST_TIMEOUT";
/// Environment variable overriding the number of retries.
pub const ENV_MAX_RETRIES: &str = "TEST_MAX_RETRIES";

/// Path prefix of every API endpoint.
pub const API_BASE_PATH: &str = "/api";

/// A named service whose base URL must be reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Service name, e.g. `backend`.
    pub name: String,
    /// Base URL probed for reachability.
    pub base_url: String,
}

impl ServiceDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }

    /// Returns the name with its first letter upper-cased.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

/// A named API endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Short name, e.g. `llms`.
    pub name: &'static str,
    /// Absolute URL.
    pub url: String,
}

/// Configuration for one harness run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Frontend base URL; API calls are routed through it.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// Backend base URL.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// LlamaStack base URL.
    #[serde(default = "default_llamastack_url")]
    pub llamastack_url: String,

    /// Default per-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_llamastack_url() -> String {
    "http://localhost:8321".to_string()
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_max_retries() -> u32 {
    1
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            frontend_url: default_frontend_url(),
            backend_url: default_backend_url(),
            llamastack_url: default_llamastack_url(),
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl HarnessConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`HarnessConfig::from_lookup`].
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup, applying defaults
    /// for absent variables.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidConfig`] if a numeric variable does not
    /// parse or a URL is malformed.
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            frontend_url: lookup(ENV_FRONTEND_URL).unwrap_or(defaults.frontend_url),
            backend_url: lookup(ENV_BACKEND_URL).unwrap_or(defaults.backend_url),
            llamastack_url: lookup(ENV_LLAMASTACK_URL).unwrap_or(defaults.llamastack_url),
            request_timeout: match lookup(ENV_REQUEST_TIMEOUT) {
                Some(raw) => Duration::from_secs(parse_number(ENV_REQUEST_TIMEOUT, &raw)?),
                None => defaults.request_timeout,
            },
            max_retries: match lookup(ENV_MAX_RETRIES) {
                Some(raw) => parse_number(ENV_MAX_RETRIES, &raw)?,
                None => defaults.max_retries,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks that every base URL is an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidConfig`] naming the first bad URL.
    pub fn validate(&self) -> DomainResult<()> {
        for (key, value) in [
            (ENV_FRONTEND_URL, &self.frontend_url),
            (ENV_BACKEND_URL, &self.backend_url),
            (ENV_LLAMASTACK_URL, &self.llamastack_url),
        ] {
            let url = Url::parse(value).map_err(|e| DomainError::InvalidConfig {
                key: key.to_string(),
                message: format!("{e}: {value}"),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(DomainError::InvalidConfig {
                    key: key.to_string(),
                    message: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
        }
        Ok(())
    }

    /// Returns the backoff policy implied by `max_retries`.
    #[must_use]
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::with_retries(self.max_retries)
    }

    /// Returns the full URL of an API path routed through the frontend.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}{API_BASE_PATH}{path}",
            self.frontend_url.trim_end_matches('/')
        )
    }

    /// Returns the named API endpoints of the backend under test.
    #[must_use]
    pub fn endpoints(&self) -> Vec<Endpoint> {
        [
            ("llms", "/llama_stack/llms"),
            ("embedding_models", "/llama_stack/embedding_models"),
            ("providers", "/llama_stack/providers"),
            ("tools", "/llama_stack/tools"),
            ("virtual_assistants", "/virtual_assistants/"),
            ("knowledge_bases", "/knowledge_bases/"),
            ("chat", "/llama_stack/chat"),
            ("chat_sessions", "/chat_sessions/"),
        ]
        .into_iter()
        .map(|(name, path)| Endpoint {
            name,
            url: self.api_url(path),
        })
        .collect()
    }

    /// Looks up one endpoint URL by name.
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Option<String> {
        self.endpoints()
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.url)
    }

    /// Returns the services that must be reachable, in probe order.
    #[must_use]
    pub fn services(&self) -> Vec<ServiceDescriptor> {
        vec![
            ServiceDescriptor::new("frontend", &self.frontend_url),
            ServiceDescriptor::new("backend", &self.backend_url),
            ServiceDescriptor::new("llamastack", &self.llamastack_url),
        ]
    }
}

impl fmt::Display for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test Configuration:")?;
        writeln!(f, "  Frontend URL: {}", self.frontend_url)?;
        writeln!(f, "  Backend URL: {}", self.backend_url)?;
        writeln!(f, "  LlamaStack URL: {}", self.llamastack_url)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout.as_secs())?;
        write!(f, "  Max Retries: {}", self.max_retries)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> DomainResult<T>
where
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e| DomainError::InvalidConfig {
        key: key.to_string(),
        message: format!("{e}: '{raw}'"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = HarnessConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.backoff_policy().max_attempts(), 2);
    }

    #[test]
    fn test_overrides() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            (ENV_FRONTEND_URL, "http://frontend:3000/"),
            (ENV_REQUEST_TIMEOUT, "30"),
            (ENV_MAX_RETRIES, "3"),
        ]))
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.backoff_policy().max_attempts(), 4);
        assert_eq!(
            config.endpoint("llms").as_deref(),
            Some("http://frontend:3000/api/llama_stack/llms")
        );
    }

    #[test]
    fn test_bad_number_is_reported() {
        let err = HarnessConfig::from_lookup(lookup_from(&[(ENV_MAX_RETRIES, "many")]))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig { ref key, .. } if key == ENV_MAX_RETRIES));
    }

    #[test]
    fn test_bad_url_is_reported() {
        let err = HarnessConfig::from_lookup(lookup_from(&[(ENV_BACKEND_URL, "localhost:8000")]))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig { ref key, .. } if key == ENV_BACKEND_URL));
    }

    #[test]
    fn test_services_in_order() {
        let names: Vec<_> = HarnessConfig::default()
            .services()
            .into_iter()
            .map(|s| s.display_name())
            .collect();
        assert_eq!(names, vec!["Frontend", "Backend", "Llamastack"]);
    }

    #[test]
    fn test_endpoint_catalogue() {
        let config = HarnessConfig::default();
        assert_eq!(config.endpoints().len(), 8);
        assert_eq!(
            config.endpoint("virtual_assistants").as_deref(),
            Some("http://localhost:5173/api/virtual_assistants/")
        );
        assert_eq!(config.endpoint("nope"), None);
    }

    #[test]
    fn test_display_summary() {
        let summary = HarnessConfig::default().to_string();
        assert!(summary.contains("Backend URL: http://localhost:8000"));
        assert!(summary.contains("Max Retries: 1"));
    }
}
