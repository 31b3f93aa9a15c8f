//! UserALE interaction-log schema.
//!
//! Required fields are checked up front so failures name the offending
//! field. Fields without a typed accessor are kept verbatim, which makes the
//! structured and text forms of a payload lossless.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LogError, json_type_name};
use crate::schema::{KeyFields, RawRecord, Schema};
use crate::timestamp::Timestamp;
use crate::types::SessionId;

const SESSION_FIELD: &str = "sessionID";
const TIME_FIELD: &str = "clientTime";
const LOG_TYPE_FIELD: &str = "logType";
const EVENT_TYPE_FIELD: &str = "type";

/// Optional fields that must be strings when present.
const OPTIONAL_STRING_FIELDS: &[&str] = &[
    "target",
    "pageUrl",
    "pageTitle",
    "userId",
    "toolName",
    "toolVersion",
];

/// A validated UserALE log.
///
/// Deserializing runs the same checks as [`UserAleSchema::validate`], so every
/// value of this type carries a non-negative `clientTime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct UserAleLog(UserAleFields);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserAleFields {
    #[serde(rename = "sessionID")]
    session_id: SessionId,
    /// Epoch milliseconds reported by the client.
    client_time: i64,
    /// `raw`, `custom`, `interval`, ...
    log_type: String,
    /// DOM event name (`click`, `load`, ...).
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl TryFrom<Map<String, Value>> for UserAleLog {
    type Error = LogError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        check_required(&map)?;
        serde_json::from_value(Value::Object(map))
            .map(Self)
            .map_err(|e| LogError::record(e.to_string()))
    }
}

impl UserAleLog {
    pub const fn session(&self) -> &SessionId {
        &self.0.session_id
    }

    /// Raw client time in epoch milliseconds.
    pub const fn client_time_millis(&self) -> i64 {
        self.0.client_time
    }

    pub fn event_type(&self) -> &str {
        &self.0.event_type
    }

    pub fn target(&self) -> Option<&str> {
        self.0.target.as_deref()
    }

    pub fn path(&self) -> Option<&[String]> {
        self.0.path.as_deref()
    }

    pub fn page_url(&self) -> Option<&str> {
        self.0.page_url.as_deref()
    }

    pub fn page_title(&self) -> Option<&str> {
        self.0.page_title.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.0.user_id.as_deref()
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.0.tool_name.as_deref()
    }

    pub fn tool_version(&self) -> Option<&str> {
        self.0.tool_version.as_deref()
    }

    pub const fn details(&self) -> Option<&Value> {
        self.0.details.as_ref()
    }

    /// Looks up a field that has no typed accessor.
    pub fn extra(&self, field: &str) -> Option<&Value> {
        self.0.extra.get(field)
    }
}

impl KeyFields for UserAleLog {
    fn session_id(&self) -> &str {
        self.0.session_id.as_str()
    }

    fn client_time(&self) -> String {
        self.0.client_time.to_string()
    }

    fn log_type(&self) -> &str {
        &self.0.log_type
    }
}

/// Schema for UserALE logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserAleSchema;

impl Schema for UserAleSchema {
    type Payload = UserAleLog;

    fn validate(&self, raw: RawRecord) -> Result<UserAleLog, LogError> {
        UserAleLog::try_from(raw.into_object()?)
    }

    fn extract_timestamp(&self, payload: &UserAleLog) -> Timestamp {
        Timestamp::saturating_from_millis(payload.0.client_time)
    }
}

fn check_required(map: &Map<String, Value>) -> Result<(), LogError> {
    require_non_empty_string(map, SESSION_FIELD)?;
    require_non_empty_string(map, LOG_TYPE_FIELD)?;
    require_non_empty_string(map, EVENT_TYPE_FIELD)?;

    match map.get(TIME_FIELD) {
        None | Some(Value::Null) => {
            return Err(LogError::timestamp("<missing>", "clientTime is required"));
        }
        Some(Value::Number(n)) => match n.as_i64() {
            Some(millis) => {
                Timestamp::from_millis(millis)?;
            }
            None => {
                return Err(LogError::timestamp(n, "must be an integer number of milliseconds"));
            }
        },
        Some(other) => {
            return Err(LogError::timestamp(other, "must be numeric"));
        }
    }

    for field in OPTIONAL_STRING_FIELDS {
        match map.get(*field) {
            None | Some(Value::Null | Value::String(_)) => {}
            Some(other) => {
                return Err(LogError::field(
                    *field,
                    format!("expected string, got {}", json_type_name(other)),
                ));
            }
        }
    }

    if let Some(Value::Array(items)) = map.get("path") {
        if items.iter().any(|item| !item.is_string()) {
            return Err(LogError::field("path", "expected an array of strings"));
        }
    }

    Ok(())
}

fn require_non_empty_string(map: &Map<String, Value>, field: &str) -> Result<(), LogError> {
    match map.get(field) {
        None => Err(LogError::field(field, "is required")),
        Some(Value::String(s)) if s.is_empty() => Err(LogError::field(field, "must not be empty")),
        Some(Value::String(_)) => Ok(()),
        Some(other) => Err(LogError::field(
            field,
            format!("expected string, got {}", json_type_name(other)),
        )),
    }
}
