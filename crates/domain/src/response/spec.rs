//! Response specification type
//!
//! Contains the status, headers, body and timing of a received HTTP
//! response, independent of the client library that produced it.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::BodyText;

/// HTTP response specification.
///
/// Contains all information received from an HTTP call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseSpec {
    /// HTTP status code.
    pub status: u16,
    /// Response headers as a map.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Response body as raw bytes.
    #[serde(default)]
    pub body: Vec<u8>,
    /// Response time.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Content-Type header value (extracted for convenience).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ResponseSpec {
    /// Creates a new `ResponseSpec` from raw response data.
    #[must_use]
    pub fn new(
        status: u16,
        headers: HashMap<String, String>,
        body: Vec<u8>,
        duration: Duration,
    ) -> Self {
        let content_type = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.clone());

        Self {
            status,
            headers,
            body,
            duration,
            content_type,
        }
    }

    /// Convenience constructor for a response carrying a text body.
    #[must_use]
    pub fn with_text(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Self::new(status, headers, body.into().into_bytes(), Duration::ZERO)
    }

    /// Attempts to parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body is not valid JSON.
    pub fn body_as_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

impl BodyText for ResponseSpec {
    fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_content_type_is_extracted_case_insensitively() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let response = ResponseSpec::new(200, headers, b"[]".to_vec(), Duration::from_millis(3));

        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert_eq!(
            response.get_header("content-type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(response.duration, Duration::from_millis(3));
    }

    #[test]
    fn test_body_text_and_json() {
        let response = ResponseSpec::with_text(200, "application/json", r#"[{"id":1}]"#);
        assert_eq!(response.body_text(), r#"[{"id":1}]"#);
        assert_eq!(response.body_as_json().unwrap(), serde_json::json!([{"id": 1}]));
    }
}
