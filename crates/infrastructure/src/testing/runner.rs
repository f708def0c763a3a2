//! Test runner implementation.
//!
//! Executes assertions against HTTP responses and produces test results.

use std::time::Instant;

use serde_json::Value;
use tracing::debug;
use verikit_domain::{
    Assertion, AssertionResult, BodyText, RecordSchema, ResponseSpec, StatusExpectation,
    TestResults, TestSuite, excerpt,
};
use verikit_domain::testing::RAW_EXCERPT_CHARS;

use super::validators::{
    decode_list, validate_contains_text, validate_exact_text, validate_records,
    validate_sse_contains_text,
};

/// Test runner that executes assertions against responses.
#[derive(Debug, Default)]
pub struct TestRunner {
    /// Whether to stop on first failure.
    stop_on_failure: bool,
}

impl TestRunner {
    /// Create a new test runner.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stop_on_failure: false,
        }
    }

    /// Set whether to stop on first failure.
    #[must_use]
    pub const fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Run a test suite against a response.
    #[must_use]
    pub fn run(&self, suite: &TestSuite, response: &ResponseSpec) -> TestResults {
        let start = Instant::now();
        let mut results = Vec::with_capacity(suite.assertions.len());

        for assertion in &suite.assertions {
            let result = self.run_assertion(assertion, response);
            let failed = !result.passed;
            if failed {
                debug!(suite = %suite.name, check = %assertion.description(), "assertion failed");
            }
            results.push(result);

            if failed && (self.stop_on_failure || suite.stop_on_failure) {
                break;
            }
        }

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        TestResults::new(&suite.name, results, duration_ms)
    }

    /// Run a single assertion against a response.
    #[must_use]
    pub fn run_assertion(&self, assertion: &Assertion, response: &ResponseSpec) -> AssertionResult {
        match assertion {
            Assertion::StatusCode { expected } => Self::check_status_code(assertion, response, expected),
            Assertion::ContentType { expected } => {
                Self::check_content_type(assertion, response, expected)
            }
            Assertion::HeaderExists { name, value } => {
                Self::check_header_exists(assertion, response, name, value.as_deref())
            }
            Assertion::SseContains { text } => validate_contains_text(response, text),
            Assertion::SseEquals { text } => validate_exact_text(response, text),
            Assertion::SseDataLineContains { text } => validate_sse_contains_text(response, text),
            Assertion::JsonList { schema } => Self::check_records(response, schema),
            Assertion::JsonListContains { field, value } => {
                Self::check_list_contains(assertion, response, field, value)
            }
            Assertion::JsonEquals { expected } => Self::check_json_equals(assertion, response, expected),
        }
    }

    fn check_status_code(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: &StatusExpectation,
    ) -> AssertionResult {
        let actual = response.status;
        if expected.matches(actual) {
            AssertionResult::pass_with_value(assertion.clone(), actual.to_string())
        } else {
            AssertionResult::fail_with_value(
                assertion.clone(),
                actual.to_string(),
                format!(
                    "Expected status {}, got {}. Raw response body: {}",
                    expected.description(),
                    actual,
                    excerpt(&response.body_text(), RAW_EXCERPT_CHARS)
                ),
            )
        }
    }

    fn check_content_type(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: &str,
    ) -> AssertionResult {
        match &response.content_type {
            Some(actual) if actual.contains(expected) => {
                AssertionResult::pass_with_value(assertion.clone(), actual.clone())
            }
            Some(actual) => AssertionResult::fail_with_value(
                assertion.clone(),
                actual.clone(),
                format!("Content-Type '{actual}' does not contain '{expected}'"),
            ),
            None => AssertionResult::fail(
                assertion.clone(),
                "No Content-Type header present".to_string(),
            ),
        }
    }

    fn check_header_exists(
        assertion: &Assertion,
        response: &ResponseSpec,
        name: &str,
        expected_value: Option<&str>,
    ) -> AssertionResult {
        match (response.get_header(name), expected_value) {
            (None, _) => AssertionResult::fail(assertion.clone(), format!("Header '{name}' not found")),
            (Some(actual), Some(expected)) if actual != expected => AssertionResult::fail_with_value(
                assertion.clone(),
                actual.clone(),
                format!("Header '{name}' value mismatch: expected '{expected}', got '{actual}'"),
            ),
            (Some(actual), _) => AssertionResult::pass_with_value(assertion.clone(), actual.clone()),
        }
    }

    fn check_records(response: &ResponseSpec, schema: &RecordSchema) -> AssertionResult {
        validate_records(response, schema)
    }

    fn check_list_contains(
        assertion: &Assertion,
        response: &ResponseSpec,
        field: &str,
        value: &Value,
    ) -> AssertionResult {
        let items = match decode_list(&response.body_text()) {
            Ok(items) => items,
            Err(message) => return AssertionResult::fail(assertion.clone(), message),
        };

        let found: Vec<&Value> = items.iter().filter_map(|item| item.get(field)).collect();
        if found.contains(&value) {
            AssertionResult::pass_with_value(assertion.clone(), value.to_string())
        } else {
            let found: Vec<String> = found.iter().map(ToString::to_string).collect();
            AssertionResult::fail_with_value(
                assertion.clone(),
                found.join(", "),
                format!(
                    "Expected {field} {value} not found in response; present: [{}]",
                    found.join(", ")
                ),
            )
        }
    }

    fn check_json_equals(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: &Value,
    ) -> AssertionResult {
        match response.body_as_json() {
            Ok(actual) if &actual == expected => AssertionResult::pass(assertion.clone()),
            Ok(actual) => AssertionResult::fail_with_value(
                assertion.clone(),
                excerpt(&actual.to_string(), RAW_EXCERPT_CHARS),
                format!(
                    "Response does not match expected. Expected: {expected} Got: {}",
                    excerpt(&actual.to_string(), RAW_EXCERPT_CHARS)
                ),
            ),
            Err(e) => AssertionResult::fail(
                assertion.clone(),
                format!("Failed to parse body as JSON: {e}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    const LLMS: &str = r#"[{"model_name":"llama3.2:3b-instruct-fp16","provider_resource_id":"llama3.2:3b-instruct-fp16","model_type":"llm"}]"#;

    fn json_response(status: u16, body: &str) -> ResponseSpec {
        ResponseSpec::with_text(status, "application/json", body)
    }

    fn sse_response(body: &str) -> ResponseSpec {
        ResponseSpec::with_text(200, "text/event-stream", body)
    }

    #[test]
    fn test_status_code_exact() {
        let runner = TestRunner::new();
        let response = json_response(200, "[]");

        let assertion = Assertion::StatusCode {
            expected: StatusExpectation::exact(200),
        };
        assert!(runner.run_assertion(&assertion, &response).passed);

        let assertion = Assertion::StatusCode {
            expected: StatusExpectation::exact(201),
        };
        let result = runner.run_assertion(&assertion, &response);
        assert!(!result.passed);
        assert_eq!(result.actual.as_deref(), Some("200"));
    }

    #[test]
    fn test_content_type() {
        let runner = TestRunner::new();
        let assertion = Assertion::ContentType {
            expected: "application/json".to_string(),
        };

        assert!(runner.run_assertion(&assertion, &json_response(200, "[]")).passed);
        assert!(!runner.run_assertion(&assertion, &sse_response("")).passed);

        let bare = ResponseSpec::new(200, HashMap::new(), Vec::new(), Duration::ZERO);
        let result = runner.run_assertion(&assertion, &bare);
        assert_eq!(result.error.as_deref(), Some("No Content-Type header present"));
    }

    #[test]
    fn test_header_exists() {
        let runner = TestRunner::new();
        let mut headers = HashMap::new();
        headers.insert("X-Request-Id".to_string(), "abc".to_string());
        let response = ResponseSpec::new(200, headers, Vec::new(), Duration::ZERO);

        let assertion = Assertion::HeaderExists {
            name: "x-request-id".to_string(),
            value: Some("abc".to_string()),
        };
        assert!(runner.run_assertion(&assertion, &response).passed);

        let assertion = Assertion::HeaderExists {
            name: "X-Missing".to_string(),
            value: None,
        };
        assert!(!runner.run_assertion(&assertion, &response).passed);
    }

    #[test]
    fn test_stream_assertions() {
        let runner = TestRunner::new();
        let response = sse_response(
            "data: {\"type\":\"text\",\"content\":\"The first president was \"}\n\
             data: {\"type\":\"tool_call\",\"content\":\"lookup\"}\n\
             data: {\"type\":\"text\",\"content\":\"George Washington.\"}\n\
             data: [DONE]\n",
        );

        let contains = Assertion::SseContains {
            text: "George Washington".to_string(),
        };
        let equals = Assertion::SseEquals {
            text: "The first president was George Washington.".to_string(),
        };
        let line = Assertion::SseDataLineContains {
            text: "tool_call".to_string(),
        };

        assert!(runner.run_assertion(&contains, &response).passed);
        assert!(runner.run_assertion(&equals, &response).passed);
        assert!(runner.run_assertion(&line, &response).passed);
    }

    #[test]
    fn test_list_contains_expected_model() {
        let runner = TestRunner::new();
        let response = json_response(200, LLMS);

        let assertion = Assertion::JsonListContains {
            field: "model_name".to_string(),
            value: json!("llama3.2:3b-instruct-fp16"),
        };
        assert!(runner.run_assertion(&assertion, &response).passed);

        let assertion = Assertion::JsonListContains {
            field: "model_name".to_string(),
            value: json!("granite"),
        };
        let result = runner.run_assertion(&assertion, &response);
        assert!(!result.passed);
        assert!(result.message().contains("\"llama3.2:3b-instruct-fp16\""));
    }

    #[test]
    fn test_json_equals_exact_response() {
        let runner = TestRunner::new();
        let expected = json!([{
            "model_name": "llama3.2:3b-instruct-fp16",
            "provider_resource_id": "llama3.2:3b-instruct-fp16",
            "model_type": "llm"
        }]);
        let assertion = Assertion::JsonEquals { expected };

        assert!(runner.run_assertion(&assertion, &json_response(200, LLMS)).passed);
        assert!(!runner.run_assertion(&assertion, &json_response(200, "[]")).passed);
    }

    #[test]
    fn test_run_suite() {
        let runner = TestRunner::new();
        let response = json_response(200, LLMS);

        let suite = TestSuite::new("llms")
            .with_assertion(Assertion::StatusCode {
                expected: StatusExpectation::exact(200),
            })
            .with_assertion(Assertion::ContentType {
                expected: "application/json".to_string(),
            })
            .with_assertion(Assertion::JsonList {
                schema: RecordSchema::models(),
            });

        let results = runner.run(&suite, &response);
        assert!(results.all_passed());
        assert_eq!(results.total, 3);
        assert_eq!(results.passed, 3);
    }

    #[test]
    fn test_stop_on_failure() {
        let runner = TestRunner::new().with_stop_on_failure(true);
        let response = json_response(404, r#"{"detail":"Not Found"}"#);

        let suite = TestSuite::new("Failing Test")
            .with_assertion(Assertion::StatusCode {
                expected: StatusExpectation::exact(200),
            })
            .with_assertion(Assertion::JsonList {
                schema: RecordSchema::tools(),
            });

        let results = runner.run(&suite, &response);
        assert!(!results.all_passed());
        assert_eq!(results.results.len(), 1);
    }
}
