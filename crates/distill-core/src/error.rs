//! Errors raised while turning a raw record into a [`crate::LogRecord`].

use thiserror::Error;

/// Per-record ingestion errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    /// The raw record is neither a JSON object nor serialized text of one.
    #[error("unsupported input type: expected a JSON object or its serialized text, got {found}")]
    InvalidInputType { found: &'static str },

    /// The record does not conform to the schema.
    #[error(
        "schema validation failed{}: {message}",
        .field.as_ref().map_or_else(String::new, |f| format!(" on `{f}`"))
    )]
    SchemaValidation {
        /// The offending field, when the schema can name it.
        field: Option<String>,
        message: String,
    },

    /// The timestamp is missing, non-numeric, or cannot be ordered.
    #[error("invalid timestamp {value}: {reason}")]
    InvalidTimestamp { value: String, reason: &'static str },
}

impl LogError {
    pub(crate) fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub(crate) fn record(message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            field: None,
            message: message.into(),
        }
    }

    pub(crate) fn timestamp(value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidTimestamp {
            value: value.to_string(),
            reason,
        }
    }
}

/// Names the JSON type of a value for error messages.
pub(crate) const fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
