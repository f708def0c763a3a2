//! Request specification type

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::HttpMethod;

/// A single request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// Everything needed to issue one HTTP request.
///
/// `timeout` is optional: a session fills in its default when it is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Request headers in insertion order.
    #[serde(default)]
    pub headers: Vec<RequestHeader>,
    /// Optional request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Per-request timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    /// Creates a request with no headers, body or timeout.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST request carrying a JSON body.
    #[must_use]
    pub fn post_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Adds a header (builder pattern).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(RequestHeader {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the body (builder pattern).
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets an explicit timeout (builder pattern).
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the effective timeout, falling back to `default`.
    #[must_use]
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_has_no_body_or_timeout() {
        let request = RequestSpec::get("http://localhost:8000");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.body, None);
        assert_eq!(request.timeout, None);
    }

    #[test]
    fn test_post_json_sets_content_type() {
        let request = RequestSpec::post_json("http://localhost/api", r#"{"a":1}"#);
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.headers[0].name, "Content-Type");
        assert_eq!(request.headers[0].value, "application/json");
        assert_eq!(request.body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_timeout_fallback() {
        let request = RequestSpec::get("http://x");
        assert_eq!(
            request.timeout_or(Duration::from_secs(10)),
            Duration::from_secs(10)
        );

        let request = request.with_timeout(Duration::from_secs(5));
        assert_eq!(
            request.timeout_or(Duration::from_secs(10)),
            Duration::from_secs(5)
        );
    }
}
