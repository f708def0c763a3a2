//! HTTP methods issued by the harness.

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method of a [`RequestSpec`](super::RequestSpec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET, used by probes and listing endpoints.
    #[default]
    Get,
    /// POST, used by the chat endpoint.
    Post,
}

impl HttpMethod {
    /// Returns the canonical upper-case token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
