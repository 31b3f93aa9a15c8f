//! Configurable schema for arbitrary JSON-object logs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LogError, json_type_name};
use crate::schema::{KeyFields, RawRecord, Schema};
use crate::timestamp::{TimeUnit, Timestamp};

/// A schema described by field names rather than a Rust type.
///
/// The session and log-type fields accept strings or numbers. The time field
/// accepts integers or floats in `time_unit` and is normalized to canonical
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSchema {
    pub session_field: String,
    pub time_field: String,
    pub type_field: String,
    /// Additional fields that must be present and non-null.
    pub required: Vec<String>,
    pub time_unit: TimeUnit,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            session_field: "sessionID".to_string(),
            time_field: "clientTime".to_string(),
            type_field: "logType".to_string(),
            required: Vec::new(),
            time_unit: TimeUnit::Milliseconds,
        }
    }
}

/// A log validated by a [`FieldSchema`].
///
/// Serializes as the original JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLog {
    fields: Map<String, Value>,
    timestamp: Timestamp,
    session_id: String,
    client_time: String,
    log_type: String,
}

impl FieldLog {
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl Serialize for FieldLog {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.fields.serialize(serializer)
    }
}

impl KeyFields for FieldLog {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn client_time(&self) -> String {
        self.client_time.clone()
    }

    fn log_type(&self) -> &str {
        &self.log_type
    }
}

impl Schema for FieldSchema {
    type Payload = FieldLog;

    fn validate(&self, raw: RawRecord) -> Result<FieldLog, LogError> {
        let fields = raw.into_object()?;

        let session_id = key_string(&fields, &self.session_field)?;
        let log_type = key_string(&fields, &self.type_field)?;

        let (timestamp, client_time) = match fields.get(&self.time_field) {
            None | Some(Value::Null) => {
                return Err(LogError::timestamp("<missing>", "time field is required"));
            }
            Some(Value::Number(n)) => {
                let ts = if let Some(raw) = n.as_i64() {
                    self.time_unit.normalize(raw)?
                } else if let Some(raw) = n.as_f64() {
                    self.time_unit.normalize_f64(raw)?
                } else {
                    return Err(LogError::timestamp(n, "out of range"));
                };
                (ts, n.to_string())
            }
            Some(other) => return Err(LogError::timestamp(other, "must be numeric")),
        };

        for field in &self.required {
            if matches!(fields.get(field), None | Some(Value::Null)) {
                return Err(LogError::field(field.as_str(), "is required"));
            }
        }

        Ok(FieldLog {
            fields,
            timestamp,
            session_id,
            client_time,
            log_type,
        })
    }

    fn extract_timestamp(&self, payload: &FieldLog) -> Timestamp {
        payload.timestamp
    }
}

fn key_string(fields: &Map<String, Value>, field: &str) -> Result<String, LogError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(LogError::field(field, "is required")),
        Some(Value::String(s)) if s.is_empty() => Err(LogError::field(field, "must not be empty")),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(LogError::field(
            field,
            format!("expected string or number, got {}", json_type_name(other)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seconds_schema() -> FieldSchema {
        FieldSchema {
            session_field: "sid".to_string(),
            time_field: "ts".to_string(),
            type_field: "kind".to_string(),
            required: vec!["user".to_string()],
            time_unit: TimeUnit::Seconds,
        }
    }

    #[test]
    fn test_normalizes_time_unit() {
        let log = seconds_schema()
            .validate(json!({"sid": 7, "ts": 1.25, "kind": "scroll", "user": "u1"}).into())
            .unwrap();
        assert_eq!(log.timestamp().millis(), 1_250);
        assert_eq!(log.session_id(), "7");
        assert_eq!(log.client_time(), "1.25");
        assert_eq!(log.log_type(), "scroll");
    }

    #[test]
    fn test_serializes_as_original_object() {
        let raw = json!({"sid": "a", "ts": 3, "kind": "k", "user": "u", "extra": [1, 2]});
        let log = seconds_schema().validate(raw.clone().into()).unwrap();
        assert_eq!(serde_json::to_value(&log).unwrap(), raw);
    }

    #[test]
    fn test_missing_required_field_named() {
        let err = seconds_schema()
            .validate(json!({"sid": "a", "ts": 3, "kind": "k"}).into())
            .unwrap_err();
        assert_eq!(err, LogError::field("user", "is required"));
    }

    #[test]
    fn test_non_numeric_time_rejected() {
        let err = seconds_schema()
            .validate(json!({"sid": "a", "ts": "noon", "kind": "k", "user": "u"}).into())
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_defaults_match_userale_field_names() {
        let schema = FieldSchema::default();
        let log = schema
            .validate(json!({"sessionID": "s", "clientTime": 5, "logType": "raw"}).into())
            .unwrap();
        assert_eq!(schema.extract_timestamp(&log).millis(), 5);
    }

    #[test]
    fn test_deserializes_partial_config() {
        let schema: FieldSchema =
            serde_json::from_value(json!({"time_field": "t", "time_unit": "microseconds"})).unwrap();
        assert_eq!(schema.time_field, "t");
        assert_eq!(schema.session_field, "sessionID");
        assert_eq!(schema.time_unit, TimeUnit::Microseconds);
    }
}
