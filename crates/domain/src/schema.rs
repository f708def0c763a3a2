//! Record schemas for JSON listing endpoints.
//!
//! A listing endpoint returns a JSON array of objects. A [`RecordSchema`]
//! names the fields every element must carry, whether an empty list is
//! acceptable, and any fields whose value is pinned.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structural expectations for every element of a JSON list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Human-readable record kind, used in diagnostics ("Model", "Tool").
    pub name: String,
    /// Fields that must be present on every element.
    pub required_fields: Vec<String>,
    /// Whether an empty list is a failure.
    #[serde(default)]
    pub require_non_empty: bool,
    /// Fields that must be present with exactly this value.
    #[serde(default)]
    pub expected_values: Vec<(String, Value)>,
}

/// A single structural violation found in a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// The list was empty but the schema requires entries.
    Empty,
    /// An element lacks a required field.
    MissingField {
        /// Position of the element in the list.
        index: usize,
        /// The element rendered as JSON.
        item: String,
        /// The missing field.
        field: String,
    },
    /// An element has a pinned field with another value.
    UnexpectedValue {
        /// Position of the element in the list.
        index: usize,
        /// The element rendered as JSON.
        item: String,
        /// The field that differs.
        field: String,
        /// The value the schema expects, rendered as JSON.
        expected: String,
        /// The value found, rendered as JSON.
        actual: String,
    },
}

impl RecordSchema {
    /// Creates a schema with the given required fields; empty lists pass.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, required_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            required_fields: required_fields.into_iter().map(Into::into).collect(),
            require_non_empty: false,
            expected_values: Vec::new(),
        }
    }

    /// Requires at least one element (builder pattern).
    #[must_use]
    pub const fn non_empty(mut self) -> Self {
        self.require_non_empty = true;
        self
    }

    /// Pins a field to a value (builder pattern).
    #[must_use]
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.expected_values.push((field.into(), value.into()));
        self
    }

    /// Language models: at least one, each with `model_type` equal to `llm`.
    #[must_use]
    pub fn models() -> Self {
        Self::new("Model", ["model_name", "provider_resource_id", "model_type"])
            .non_empty()
            .with_value("model_type", "llm")
    }

    /// Virtual assistants; none is acceptable.
    #[must_use]
    pub fn virtual_assistants() -> Self {
        Self::new(
            "Assistant",
            [
                "id",
                "name",
                "model_name",
                "prompt",
                "tools",
                "knowledge_base_ids",
            ],
        )
    }

    /// Tools; none is acceptable.
    #[must_use]
    pub fn tools() -> Self {
        Self::new("Tool", ["toolgroup_id", "name"])
    }

    /// Embedding models; none is acceptable.
    #[must_use]
    pub fn embedding_models() -> Self {
        Self::new("Embedding model", ["name", "provider_resource_id", "model_type"])
    }

    /// Caller-supplied required fields; none is acceptable.
    #[must_use]
    pub fn generic<I, S>(required_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("Item", required_fields)
    }

    /// Checks every element of `items`, returning the first violation.
    ///
    /// Elements that are not JSON objects lack every field.
    #[must_use]
    pub fn check(&self, items: &[Value]) -> Option<SchemaViolation> {
        if items.is_empty() {
            return self.require_non_empty.then_some(SchemaViolation::Empty);
        }

        for (index, item) in items.iter().enumerate() {
            let object = item.as_object();

            for field in &self.required_fields {
                if !object.is_some_and(|o| o.contains_key(field)) {
                    return Some(SchemaViolation::MissingField {
                        index,
                        item: item.to_string(),
                        field: field.clone(),
                    });
                }
            }

            for (field, expected) in &self.expected_values {
                match object.and_then(|o| o.get(field)) {
                    None => {
                        return Some(SchemaViolation::MissingField {
                            index,
                            item: item.to_string(),
                            field: field.clone(),
                        });
                    }
                    Some(actual) if actual != expected => {
                        return Some(SchemaViolation::UnexpectedValue {
                            index,
                            item: item.to_string(),
                            field: field.clone(),
                            expected: expected.to_string(),
                            actual: actual.to_string(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        None
    }

    /// Renders a violation in the schema's vocabulary.
    #[must_use]
    pub fn describe(&self, violation: &SchemaViolation) -> String {
        match violation {
            SchemaViolation::Empty => format!(
                "Response should contain at least one {}",
                self.name.to_lowercase()
            ),
            SchemaViolation::MissingField { item, field, .. } => {
                format!("{} {item} missing {field}", self.name)
            }
            SchemaViolation::UnexpectedValue {
                item,
                field,
                expected,
                actual,
                ..
            } => format!(
                "{} {item} has incorrect {field}: expected {expected}, got {actual}",
                self.name
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn llama() -> Value {
        json!({
            "model_name": "llama3.2:3b-instruct-fp16",
            "provider_resource_id": "llama3.2:3b-instruct-fp16",
            "model_type": "llm"
        })
    }

    #[test]
    fn test_models_accepts_llm() {
        assert_eq!(RecordSchema::models().check(&[llama()]), None);
    }

    #[test]
    fn test_models_rejects_embedding_type() {
        let mut model = llama();
        model["model_type"] = json!("embedding");

        let violation = RecordSchema::models().check(&[model]);
        assert!(matches!(
            violation,
            Some(SchemaViolation::UnexpectedValue { ref field, .. }) if field == "model_type"
        ));
    }

    #[test]
    fn test_models_rejects_empty_list() {
        assert_eq!(RecordSchema::models().check(&[]), Some(SchemaViolation::Empty));
        assert_eq!(
            RecordSchema::models().describe(&SchemaViolation::Empty),
            "Response should contain at least one model"
        );
    }

    #[test]
    fn test_optional_listings_accept_empty() {
        assert_eq!(RecordSchema::virtual_assistants().check(&[]), None);
        assert_eq!(RecordSchema::tools().check(&[]), None);
        assert_eq!(RecordSchema::embedding_models().check(&[]), None);
    }

    #[test]
    fn test_missing_field_names_item_and_field() {
        let schema = RecordSchema::tools();
        let items = vec![
            json!({"toolgroup_id": "builtin::websearch", "name": "web_search"}),
            json!({"toolgroup_id": "mcp::weather"}),
        ];

        let violation = schema.check(&items).unwrap();
        assert!(matches!(violation, SchemaViolation::MissingField { index: 1, .. }));
        assert_eq!(
            schema.describe(&violation),
            r#"Tool {"toolgroup_id":"mcp::weather"} missing name"#
        );
    }

    #[test]
    fn test_non_object_element_misses_fields() {
        let schema = RecordSchema::generic(["id"]);
        assert!(matches!(
            schema.check(&[json!("just a string")]),
            Some(SchemaViolation::MissingField { .. })
        ));
    }
}
