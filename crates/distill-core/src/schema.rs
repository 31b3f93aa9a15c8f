//! The schema capability consumed by the core.
//!
//! A schema validates raw input into a typed payload and extracts the
//! payload's canonical timestamp. Nothing else about a schema is visible to
//! identity assignment, streams or segmentation.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{LogError, json_type_name};
use crate::timestamp::Timestamp;

/// One raw log record before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// Serialized JSON text.
    Text(String),
    /// Already-parsed structured data.
    Structured(Value),
}

impl RawRecord {
    /// Resolves the record into a JSON object.
    ///
    /// Text that is not JSON is a schema failure; JSON that is not an object
    /// is an unsupported input type.
    pub fn into_object(self) -> Result<Map<String, Value>, LogError> {
        let value = match self {
            Self::Text(text) => serde_json::from_str::<Value>(&text)
                .map_err(|e| LogError::record(format!("invalid JSON: {e}")))?,
            Self::Structured(value) => value,
        };
        match value {
            Value::Object(map) => Ok(map),
            other => Err(LogError::InvalidInputType {
                found: json_type_name(&other),
            }),
        }
    }
}

impl From<String> for RawRecord {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawRecord {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self::Structured(Value::Object(map))
    }
}

/// Validation and timestamp extraction for one log shape.
///
/// Implementations must be deterministic: validating the structured or text
/// form of a payload produced by the same schema yields an equal payload.
pub trait Schema: Sync {
    /// The validated payload type.
    type Payload: Serialize + PartialEq + Send + Sync;

    /// Validates a raw record.
    fn validate(&self, raw: RawRecord) -> Result<Self::Payload, LogError>;

    /// Returns the canonical timestamp of a validated payload.
    fn extract_timestamp(&self, payload: &Self::Payload) -> Timestamp;
}

/// Domain fields used by the default stream key policy.
pub trait KeyFields {
    /// The session the log belongs to.
    fn session_id(&self) -> &str;

    /// The raw client-reported time, as it appeared in the input.
    fn client_time(&self) -> String;

    /// The log-type discriminator.
    fn log_type(&self) -> &str;
}
