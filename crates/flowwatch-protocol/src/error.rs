use thiserror::Error;

/// A backend payload that does not match the expected schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("response body is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("expected a JSON array of {kind} records, got {found}")]
    NotAnArray { kind: &'static str, found: &'static str },

    #[error("invalid {kind} record at index {index}: {reason}")]
    InvalidRecord {
        kind: &'static str,
        index: usize,
        reason: String,
    },

    #[error("invalid action response: {0}")]
    InvalidActionResponse(String),
}

/// Name of a JSON value's type, for error messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
