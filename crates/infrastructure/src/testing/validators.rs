//! Response validators.
//!
//! Each validator takes anything implementing [`BodyText`] and returns an
//! [`AssertionResult`]: pass/fail plus a diagnostic that echoes the
//! expected value and enough of the actual body to debug without
//! rerunning.

use serde_json::Value;
use verikit_domain::sse::{self, Aggregation};
use verikit_domain::testing::{DATA_LINES_SHOWN, RAW_EXCERPT_CHARS};
use verikit_domain::{
    Assertion, AssertionResult, BodyText, MatchSource, RecordSchema, excerpt,
};

/// Passes if `expected` occurs in the aggregated SSE text, or else in the
/// raw body.
///
/// The raw-body fallback lets non-SSE responses be checked with the same
/// validator. It also means a broken aggregation can still pass; the result
/// records [`MatchSource::RawBody`] when the fallback was what matched.
pub fn validate_contains_text<B: BodyText + ?Sized>(response: &B, expected: &str) -> AssertionResult {
    let assertion = Assertion::SseContains {
        text: expected.to_string(),
    };
    let body = response.body_text();
    let aggregation = sse::aggregate(&body);

    if aggregation.text.contains(expected) {
        return AssertionResult::pass_with_value(assertion, aggregation.text)
            .via(MatchSource::Aggregated);
    }
    if body.contains(expected) {
        return AssertionResult::pass_with_value(assertion, aggregation.text)
            .via(MatchSource::RawBody);
    }

    let message = format!(
        "Expected text '{expected}' not found in response. \
         Combined text from SSE chunks: '{}' Raw response body: {}",
        aggregation.text,
        excerpt(&body, RAW_EXCERPT_CHARS)
    );
    AssertionResult::fail_with_value(assertion, aggregation.text, message)
}

/// Passes only if the aggregated SSE text equals `expected` exactly.
///
/// There is no raw-body fallback.
pub fn validate_exact_text<B: BodyText + ?Sized>(response: &B, expected: &str) -> AssertionResult {
    let assertion = Assertion::SseEquals {
        text: expected.to_string(),
    };
    let body = response.body_text();
    let aggregation = sse::aggregate(&body);

    if aggregation.text == expected {
        return AssertionResult::pass_with_value(assertion, aggregation.text)
            .via(MatchSource::Aggregated);
    }

    let message = format!(
        "Expected stream text '{expected}' but got '{}' ({}). Raw response body: {}",
        aggregation.text,
        chunk_summary(&aggregation),
        excerpt(&body, RAW_EXCERPT_CHARS)
    );
    AssertionResult::fail_with_value(assertion, aggregation.text, message)
}

/// Passes if some raw `data:` line contains `expected` verbatim.
///
/// Lines are not decoded, so this checks what was transmitted rather than
/// the reconstructed message.
pub fn validate_sse_contains_text<B: BodyText + ?Sized>(
    response: &B,
    expected: &str,
) -> AssertionResult {
    let assertion = Assertion::SseDataLineContains {
        text: expected.to_string(),
    };
    let body = response.body_text();

    if let Some(line) = sse::data_lines(&body).find(|line| line.contains(expected)) {
        return AssertionResult::pass_with_value(assertion, line);
    }

    let shown: Vec<String> = sse::data_lines(&body)
        .take(DATA_LINES_SHOWN)
        .map(|line| excerpt(line, RAW_EXCERPT_CHARS))
        .collect();
    AssertionResult::fail(
        assertion,
        format!("Expected text '{expected}' not found in SSE data lines. Data lines: {shown:?}..."),
    )
}

/// Decodes the body as a JSON list and checks it against `schema`.
pub fn validate_records<B: BodyText + ?Sized>(response: &B, schema: &RecordSchema) -> AssertionResult {
    let assertion = Assertion::JsonList {
        schema: schema.clone(),
    };

    let items = match decode_list(&response.body_text()) {
        Ok(items) => items,
        Err(message) => return AssertionResult::fail(assertion, message),
    };

    match schema.check(&items) {
        None => AssertionResult::pass_with_value(assertion, format!("{} record(s)", items.len())),
        Some(violation) => AssertionResult::fail_with_value(
            assertion,
            format!("{} record(s)", items.len()),
            schema.describe(&violation),
        ),
    }
}

/// Language-model listing: non-empty, every entry an `llm`.
pub fn validate_models_response<B: BodyText + ?Sized>(response: &B) -> AssertionResult {
    validate_records(response, &RecordSchema::models())
}

/// Virtual-assistant listing.
pub fn validate_virtual_assistants_response<B: BodyText + ?Sized>(response: &B) -> AssertionResult {
    validate_records(response, &RecordSchema::virtual_assistants())
}

/// Tool listing.
pub fn validate_tools_response<B: BodyText + ?Sized>(response: &B) -> AssertionResult {
    validate_records(response, &RecordSchema::tools())
}

/// Embedding-model listing.
pub fn validate_embedding_models_response<B: BodyText + ?Sized>(response: &B) -> AssertionResult {
    validate_records(response, &RecordSchema::embedding_models())
}

/// Any listing whose entries must carry `fields`.
pub fn validate_api_response_structure<B: BodyText + ?Sized>(
    response: &B,
    fields: &[&str],
) -> AssertionResult {
    validate_records(response, &RecordSchema::generic(fields.iter().copied()))
}

/// Decodes `body` as a JSON array.
pub(crate) fn decode_list(body: &str) -> Result<Vec<Value>, String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(format!(
            "Response should be a list, got {}",
            excerpt(&other.to_string(), RAW_EXCERPT_CHARS)
        )),
        Err(e) => Err(format!(
            "Failed to parse body as JSON: {e}. Raw response body: {}",
            excerpt(body, RAW_EXCERPT_CHARS)
        )),
    }
}

fn chunk_summary(aggregation: &Aggregation) -> String {
    format!(
        "{} text chunk(s), {} other, {} malformed",
        aggregation.text_chunks, aggregation.other_chunks, aggregation.malformed_chunks
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use verikit_domain::ResponseSpec;

    const HI_THERE: &str = "data: {\"type\":\"text\",\"content\":\"Hi\"}\n\
                            data: {\"type\":\"text\",\"content\":\" there\"}\n\
                            data: [DONE]";

    #[test]
    fn test_scenario_hi_there() {
        assert!(validate_exact_text(HI_THERE, "Hi there").passed);
        assert!(validate_contains_text(HI_THERE, "Hi").passed);
    }

    #[test]
    fn test_exact_rejects_superset_and_subset() {
        let body = "data: {\"type\":\"text\",\"content\":\"Hello!\"}\n";
        assert!(!validate_exact_text(body, "Hello").passed);
        assert!(validate_contains_text(body, "Hello").passed);

        let body = "data: {\"type\":\"text\",\"content\":\"Hell\"}\n";
        assert!(!validate_exact_text(body, "Hello").passed);
    }

    #[test]
    fn test_exact_has_no_raw_fallback() {
        let body = "Hello";
        assert!(!validate_exact_text(body, "Hello").passed);
    }

    #[test]
    fn test_contains_falls_back_to_raw_body() {
        let result = validate_contains_text("plain text answer: George Washington", "Washington");
        assert!(result.passed);
        assert_eq!(result.matched_via, Some(MatchSource::RawBody));

        let result = validate_contains_text(HI_THERE, "there");
        assert_eq!(result.matched_via, Some(MatchSource::Aggregated));
    }

    #[test]
    fn test_contains_failure_echoes_expected_and_body() {
        let result = validate_contains_text(HI_THERE, "Goodbye");
        assert!(!result.passed);

        let message = result.message();
        assert!(message.contains("'Goodbye'"));
        assert!(message.contains("Combined text from SSE chunks: 'Hi there'"));
        assert!(message.contains("data: [DONE]"));
    }

    #[test]
    fn test_raw_excerpt_is_bounded() {
        let body = "x".repeat(2_000);
        let message = validate_contains_text(body.as_str(), "y").message();
        assert!(message.len() < 700);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_exact_failure_reports_chunks() {
        let body = "data: {\"type\":\"text\",\"content\":\"A\"}\ndata: oops\n";
        let message = validate_exact_text(body, "AB").message();
        assert!(message.contains("Expected stream text 'AB' but got 'A'"));
        assert!(message.contains("1 text chunk(s), 0 other, 1 malformed"));
    }

    #[test]
    fn test_data_line_match_is_verbatim() {
        let body = "event: message\ndata: {\"type\":\"tool_call\",\"name\":\"web_search\"}\n";
        assert!(validate_sse_contains_text(body, "web_search").passed);
        assert!(!validate_sse_contains_text(body, "message").passed);
    }

    #[test]
    fn test_data_line_match_does_not_span_lines() {
        let body = "data: {\"type\":\"text\",\"content\":\"Hi\"}\n\
                    data: {\"type\":\"text\",\"content\":\" there\"}\n";
        assert!(!validate_sse_contains_text(body, "Hi there").passed);
    }

    #[test]
    fn test_data_line_failure_is_bounded() {
        let mut body = format!("data: {}\n", "x".repeat(2_000));
        for n in 1..15 {
            body.push_str(&format!("data: line-{n}\n"));
        }

        let result = validate_sse_contains_text(body.as_str(), "missing");
        let message = result.message();

        assert!(!result.passed);
        assert!(message.contains("\"data: line-9\""), "{message}");
        assert!(!message.contains("line-10"), "{message}");
        assert!(message.contains(&format!("{}...", "x".repeat(494))));
        assert!(message.chars().count() < 1_000, "{}", message.len());
    }

    #[test]
    fn test_models_scenario() {
        let body = r#"[{"model_name":"llama3.2:3b-instruct-fp16","provider_resource_id":"llama3.2:3b-instruct-fp16","model_type":"llm"}]"#;
        let response = ResponseSpec::with_text(200, "application/json", body);
        assert!(validate_models_response(&response).passed);

        let response = ResponseSpec::with_text(
            200,
            "application/json",
            body.replace("\"llm\"", "\"embedding\""),
        );
        let result = validate_models_response(&response);
        assert!(!result.passed);
        assert!(result.message().contains("incorrect model_type"));
    }

    #[test]
    fn test_empty_lists() {
        assert!(!validate_models_response("[]").passed);
        assert!(validate_virtual_assistants_response("[]").passed);
        assert!(validate_tools_response("[]").passed);
        assert!(validate_embedding_models_response("[]").passed);
    }

    #[test]
    fn test_assistant_missing_field() {
        let body = r#"[{"id":"a1","name":"Helper","model_name":"m","prompt":"p","tools":[]}]"#;
        let result = validate_virtual_assistants_response(body);
        assert!(!result.passed);
        assert!(result.message().ends_with("missing knowledge_base_ids"));
    }

    #[test]
    fn test_generic_structure() {
        let body = r#"[{"id":1,"name":"kb"},{"id":2}]"#;
        assert!(validate_api_response_structure(body, &["id"]).passed);
        assert!(!validate_api_response_structure(body, &["id", "name"]).passed);
    }

    #[test]
    fn test_non_list_bodies() {
        let result = validate_tools_response(r#"{"detail":"Not Found"}"#);
        assert!(result.message().starts_with("Response should be a list"));

        let result = validate_tools_response("<html>");
        assert!(result.message().starts_with("Failed to parse body as JSON"));
    }
}
