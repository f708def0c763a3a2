//! Server-sent-event text aggregation.
//!
//! The streaming endpoints under test emit newline-separated lines where
//! payload lines start with `data: ` and carry a JSON object such as
//! `{"type":"text","content":"Hi"}`. The stream ends with `data: [DONE]`.
//! Other framing lines (blank lines, `event:`, comments) carry nothing.
//!
//! Aggregation is a single pass over the body. Chunks that fail to decode,
//! or decode to something other than a text chunk, are skipped and counted;
//! they never abort aggregation.

use serde::Deserialize;

/// Prefix of a payload line.
pub const DATA_PREFIX: &str = "data: ";

/// Field name that marks a data line when scanning raw lines.
pub const DATA_FIELD: &str = "data:";

/// Line that terminates the stream.
pub const TERMINATOR_LINE: &str = "data: [DONE]";

/// Chunk type whose `content` contributes to the aggregated text.
pub const TEXT_CHUNK_TYPE: &str = "text";

/// Classification of a single body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// A payload line; holds the text after [`DATA_PREFIX`].
    Data(&'a str),
    /// The stream terminator.
    Terminator,
    /// Anything else, including blank lines.
    Ignored,
}

impl<'a> SseLine<'a> {
    /// Classifies one line of the body.
    #[must_use]
    pub fn classify(line: &'a str) -> Self {
        if line == TERMINATOR_LINE {
            return Self::Terminator;
        }
        line.strip_prefix(DATA_PREFIX)
            .map_or(Self::Ignored, Self::Data)
    }
}

/// A decoded data-line payload.
///
/// Only the `type` field is required. Unknown fields are ignored so that
/// tool-call and metadata chunks still decode; they just contribute nothing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SseChunk {
    /// Chunk type, e.g. `text` or `tool_call`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Text content, present on text chunks.
    #[serde(default)]
    pub content: Option<String>,
}

impl SseChunk {
    /// Decodes a payload, returning `None` for anything that is not a
    /// JSON object with a string `type`.
    ///
    /// The payload is read into a [`serde_json::Value`] first, so a key
    /// repeated within one object keeps its last value.
    #[must_use]
    pub fn decode(payload: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(payload).ok()?;
        serde_json::from_value(value).ok()
    }

    /// Returns the content if this is a text chunk.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.kind == TEXT_CHUNK_TYPE {
            self.content.as_deref()
        } else {
            None
        }
    }
}

/// Result of aggregating one body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Concatenated content of every text chunk, in arrival order.
    pub text: String,
    /// Number of text chunks that contributed.
    pub text_chunks: usize,
    /// Number of decoded chunks of another type (or text chunks without content).
    pub other_chunks: usize,
    /// Number of data lines whose payload could not be decoded.
    pub malformed_chunks: usize,
    /// Whether the terminator line was seen.
    pub terminated: bool,
}

/// Parses `body` as an SSE stream and reconstructs its text.
#[must_use]
pub fn aggregate(body: &str) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for line in body.lines() {
        match SseLine::classify(line) {
            SseLine::Ignored => {}
            SseLine::Terminator => aggregation.terminated = true,
            SseLine::Data(payload) => match SseChunk::decode(payload) {
                None => aggregation.malformed_chunks += 1,
                Some(chunk) => match chunk.text() {
                    Some(content) => {
                        aggregation.text.push_str(content);
                        aggregation.text_chunks += 1;
                    }
                    None => aggregation.other_chunks += 1,
                },
            },
        }
    }

    aggregation
}

/// Returns only the aggregated text of `body`.
#[must_use]
pub fn aggregate_text(body: &str) -> String {
    aggregate(body).text
}

/// Iterates over the raw lines of `body` that start with `data:`.
///
/// No decoding is attempted; the terminator line is included.
pub fn data_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines().filter(|line| line.starts_with(DATA_FIELD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify() {
        assert_eq!(SseLine::classify("data: [DONE]"), SseLine::Terminator);
        assert_eq!(SseLine::classify("data: {}"), SseLine::Data("{}"));
        assert_eq!(SseLine::classify(""), SseLine::Ignored);
        assert_eq!(SseLine::classify("event: message"), SseLine::Ignored);
        assert_eq!(SseLine::classify("data:{}"), SseLine::Ignored);
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(aggregate(""), Aggregation::default());
    }

    #[test]
    fn test_body_without_data_lines() {
        let body = ": keep-alive\n\nevent: ping\nretry: 100\n";
        assert_eq!(aggregate_text(body), "");
    }

    #[test]
    fn test_preserves_arrival_order() {
        let body = "data: {\"type\":\"text\",\"content\":\"A\"}\n\
                    data: {\"type\":\"text\",\"content\":\"B\"}\n";
        assert_eq!(aggregate_text(body), "AB");
    }

    #[test]
    fn test_scenario_hi_there() {
        let body = "data: {\"type\":\"text\",\"content\":\"Hi\"}\n\
                    data: {\"type\":\"text\",\"content\":\" there\"}\n\
                    data: [DONE]";
        let aggregation = aggregate(body);
        assert_eq!(aggregation.text, "Hi there");
        assert_eq!(aggregation.text_chunks, 2);
        assert!(aggregation.terminated);
        assert_eq!(aggregation.malformed_chunks, 0);
    }

    #[test]
    fn test_malformed_chunk_is_skipped() {
        let body = "data: {\"type\":\"text\",\"content\":\"ok\"}\ndata: {not json\n";
        let aggregation = aggregate(body);
        assert_eq!(aggregation.text, "ok");
        assert_eq!(aggregation.malformed_chunks, 1);
    }

    #[test]
    fn test_non_text_chunks_contribute_nothing() {
        let body = "data: {\"type\":\"tool_call\",\"content\":\"X\"}\n\
                    data: {\"type\":\"text\"}\n";
        let aggregation = aggregate(body);
        assert_eq!(aggregation.text, "");
        assert_eq!(aggregation.other_chunks, 2);
    }

    #[test]
    fn test_unexpected_shapes_are_malformed() {
        let body = "data: [1,2,3]\n\
                    data: \"text\"\n\
                    data: {\"content\":\"no type\"}\n\
                    data: {\"type\":\"text\",\"content\":42}\n";
        let aggregation = aggregate(body);
        assert_eq!(aggregation.text, "");
        assert_eq!(aggregation.malformed_chunks, 4);
    }

    #[test]
    fn test_duplicates_are_kept_and_content_untrimmed() {
        let body = "data: {\"type\":\"text\",\"content\":\" x \"}\n\
                    data: {\"type\":\"text\",\"content\":\" x \"}\n";
        assert_eq!(aggregate_text(body), " x  x ");
    }

    #[test]
    fn test_repeated_key_keeps_last_value() {
        let aggregation = aggregate("data: {\"type\":\"text\",\"content\":\"A\",\"content\":\"B\"}\n");
        assert_eq!(aggregation.text, "B");
        assert_eq!(aggregation.text_chunks, 1);
        assert_eq!(aggregation.malformed_chunks, 0);
    }

    #[test]
    fn test_crlf_line_endings() {
        let body = "data: {\"type\":\"text\",\"content\":\"a\"}\r\n\r\ndata: [DONE]\r\n";
        let aggregation = aggregate(body);
        assert_eq!(aggregation.text, "a");
        assert!(aggregation.terminated);
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let body = "data: {\"type\":\"text\",\"content\":\"one\"}\ngarbage\ndata: {\"type\":\"text\",\"content\":\"two\"}";
        assert_eq!(aggregate(body), aggregate(body));
    }

    #[test]
    fn test_data_lines_include_unspaced_prefix() {
        let body = "event: x\ndata:raw\ndata: {\"a\":1}\n\ndata: [DONE]";
        let lines: Vec<_> = data_lines(body).collect();
        assert_eq!(lines, vec!["data:raw", "data: {\"a\":1}", "data: [DONE]"]);
    }
}
