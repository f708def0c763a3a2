//! Response testing and assertions.
//!
//! This module provides types for defining checks on HTTP responses and
//! recording their outcomes. Evaluation lives in the infrastructure
//! crate's test runner; everything here is plain data.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::RecordSchema;

/// Maximum number of raw-body characters echoed in a failure message.
pub const RAW_EXCERPT_CHARS: usize = 500;

/// Maximum number of data lines echoed in a failure message.
pub const DATA_LINES_SHOWN: usize = 10;

/// A check to run against a response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Check response status code.
    StatusCode {
        /// Expected status code or range.
        expected: StatusExpectation,
    },
    /// Check content type.
    ContentType {
        /// Expected content type (partial match).
        expected: String,
    },
    /// Check header exists and optionally its value.
    HeaderExists {
        /// Header name (case-insensitive).
        name: String,
        /// Optional expected value.
        value: Option<String>,
    },
    /// Aggregated SSE text contains `text`, falling back to the raw body.
    ///
    /// The fallback is permissive: a body that is not SSE at all still
    /// passes when it contains the text literally.
    SseContains {
        /// Text to search for.
        text: String,
    },
    /// Aggregated SSE text equals `text` exactly.
    SseEquals {
        /// Expected reconstructed message.
        text: String,
    },
    /// Some raw `data:` line contains `text` verbatim.
    SseDataLineContains {
        /// Fragment to search for.
        text: String,
    },
    /// Body is a JSON list whose elements satisfy a schema.
    JsonList {
        /// Structural expectations.
        schema: RecordSchema,
    },
    /// Body is a JSON list with an element whose `field` equals `value`.
    JsonListContains {
        /// Field to inspect on each element.
        field: String,
        /// Value to look for.
        value: serde_json::Value,
    },
    /// Body decodes to exactly this JSON value.
    JsonEquals {
        /// Expected document.
        expected: serde_json::Value,
    },
}

impl Assertion {
    /// Get a human-readable description of this assertion.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::StatusCode { expected } => format!("Status code {}", expected.description()),
            Self::ContentType { expected } => format!("Content-Type contains '{expected}'"),
            Self::HeaderExists {
                name,
                value: Some(v),
            } => format!("Header '{name}' equals '{v}'"),
            Self::HeaderExists { name, value: None } => format!("Header '{name}' exists"),
            Self::SseContains { text } => format!("Stream text contains '{text}'"),
            Self::SseEquals { text } => format!("Stream text equals '{text}'"),
            Self::SseDataLineContains { text } => format!("A data line contains '{text}'"),
            Self::JsonList { schema } => format!(
                "List of {} records with [{}]",
                schema.name.to_lowercase(),
                schema.required_fields.join(", ")
            ),
            Self::JsonListContains { field, value } => {
                format!("List has an entry with {field} = {value}")
            }
            Self::JsonEquals { .. } => "Body equals expected JSON".to_string(),
        }
    }
}

/// Expected status code value or range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusExpectation {
    /// Exact status code.
    Exact(u16),
    /// Range of status codes (e.g., 200-299).
    Range {
        /// Minimum status code (inclusive).
        min: u16,
        /// Maximum status code (inclusive).
        max: u16,
    },
    /// One of multiple status codes.
    OneOf(Vec<u16>),
}

impl StatusExpectation {
    /// Check if a status code matches this expectation.
    #[must_use]
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::Exact(expected) => status == *expected,
            Self::Range { min, max } => (*min..=*max).contains(&status),
            Self::OneOf(codes) => codes.contains(&status),
        }
    }

    /// Get description of the expectation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Exact(code) => format!("= {code}"),
            Self::Range { min, max } => format!("in {min}-{max}"),
            Self::OneOf(codes) => {
                let codes: Vec<_> = codes.iter().map(ToString::to_string).collect();
                format!("in [{}]", codes.join(", "))
            }
        }
    }

    /// Create a "success" expectation (200-299).
    #[must_use]
    pub const fn success() -> Self {
        Self::Range { min: 200, max: 299 }
    }

    /// Create an exact status expectation.
    #[must_use]
    pub const fn exact(code: u16) -> Self {
        Self::Exact(code)
    }
}

impl Default for StatusExpectation {
    fn default() -> Self {
        Self::success()
    }
}

/// Which view of the body satisfied a contains-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// The text reconstructed from SSE chunks.
    Aggregated,
    /// The unparsed body, used as a fallback.
    RawBody,
}

/// Result of running a single assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResult {
    /// The assertion that was run.
    pub assertion: Assertion,
    /// Whether the assertion passed.
    pub passed: bool,
    /// Actual value found (for display).
    pub actual: Option<String>,
    /// Error message if failed.
    pub error: Option<String>,
    /// For text matches, which view of the body matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_via: Option<MatchSource>,
}

impl AssertionResult {
    /// Create a passed result.
    #[must_use]
    pub const fn pass(assertion: Assertion) -> Self {
        Self {
            assertion,
            passed: true,
            actual: None,
            error: None,
            matched_via: None,
        }
    }

    /// Create a passed result with actual value.
    #[must_use]
    pub fn pass_with_value(assertion: Assertion, actual: impl Into<String>) -> Self {
        Self {
            actual: Some(actual.into()),
            ..Self::pass(assertion)
        }
    }

    /// Create a failed result.
    #[must_use]
    pub fn fail(assertion: Assertion, error: impl Into<String>) -> Self {
        Self {
            assertion,
            passed: false,
            actual: None,
            error: Some(error.into()),
            matched_via: None,
        }
    }

    /// Create a failed result with actual value.
    #[must_use]
    pub fn fail_with_value(
        assertion: Assertion,
        actual: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            actual: Some(actual.into()),
            ..Self::fail(assertion, error)
        }
    }

    /// Records which view of the body matched (builder pattern).
    #[must_use]
    pub const fn via(mut self, source: MatchSource) -> Self {
        self.matched_via = Some(source);
        self
    }

    /// Returns the diagnostic message, or the description when passed.
    #[must_use]
    pub fn message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| self.assertion.description())
    }

    /// Converts the outcome into a `Result` for use with `?`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFailure`] carrying the diagnostic if the
    /// assertion failed.
    pub fn into_result(self) -> Result<(), ValidationFailure> {
        if self.passed {
            Ok(())
        } else {
            Err(ValidationFailure {
                check: self.assertion.description(),
                message: self.message(),
            })
        }
    }
}

/// A failed check, as an error value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{check} failed: {message}")]
pub struct ValidationFailure {
    /// Description of the check.
    pub check: String,
    /// Diagnostic message.
    pub message: String,
}

/// A named group of assertions run against one response.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TestSuite {
    /// Test suite name.
    pub name: String,
    /// Assertions to run.
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    /// Whether to stop on first failure.
    #[serde(default)]
    pub stop_on_failure: bool,
}

impl TestSuite {
    /// Create a new empty test suite.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assertions: Vec::new(),
            stop_on_failure: false,
        }
    }

    /// Add an assertion (builder pattern).
    #[must_use]
    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Get the number of assertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    /// Check if the suite is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }
}

/// Results from running a test suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResults {
    /// Test suite that was run.
    pub suite_name: String,
    /// Individual assertion results.
    pub results: Vec<AssertionResult>,
    /// Total number of assertions.
    pub total: usize,
    /// Number of passed assertions.
    pub passed: usize,
    /// Number of failed assertions.
    pub failed: usize,
    /// Execution time in milliseconds.
    pub duration_ms: u64,
}

impl TestResults {
    /// Create new test results.
    #[must_use]
    pub fn new(
        suite_name: impl Into<String>,
        results: Vec<AssertionResult>,
        duration_ms: u64,
    ) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();

        Self {
            suite_name: suite_name.into(),
            results,
            total,
            passed,
            failed: total - passed,
            duration_ms,
        }
    }

    /// Check if all tests passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Iterates over the failed results.
    pub fn failures(&self) -> impl Iterator<Item = &AssertionResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Returns at most `max_chars` characters of `text`, marking truncation with `...`.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
