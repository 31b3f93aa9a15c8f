//! Validated log records.

use std::cmp::Ordering;

use serde::Serialize;
use serde::ser::SerializeStruct;
use serde_json::Value;

use crate::error::LogError;
use crate::identity::{self, LogId};
use crate::schema::{RawRecord, Schema};
use crate::timestamp::Timestamp;

/// A validated payload together with its assigned identifier.
///
/// Records carry two distinct relations:
///
/// - `==` compares payload content only;
/// - ordering ([`LogRecord::identity_cmp`], and `<`/`>` through
///   [`PartialOrd`]) compares identifiers, i.e. canonical timestamp first and
///   content digest second.
///
/// Because identifiers are derived from content, records with equal payloads
/// under the same schema also compare equal in order; the relations only
/// diverge for records built outside a schema (see [`LogRecord::from_parts`]).
#[derive(Debug, Clone)]
pub struct LogRecord<P> {
    payload: P,
    id: LogId,
}

impl<P: Serialize> LogRecord<P> {
    /// Validates `raw` against `schema` and assigns an identifier.
    pub fn new<S>(raw: impl Into<RawRecord>, schema: &S) -> Result<Self, LogError>
    where
        S: Schema<Payload = P> + ?Sized,
    {
        let payload = schema.validate(raw.into())?;
        let timestamp = schema.extract_timestamp(&payload);
        Self::from_parts(payload, timestamp)
    }

    /// Builds a record from an already-validated payload and its timestamp.
    pub fn from_parts(payload: P, timestamp: Timestamp) -> Result<Self, LogError> {
        let id = identity::assign(&payload, timestamp)?;
        Ok(Self { payload, id })
    }

    /// The payload as structured JSON (without the identifier).
    pub fn to_structured(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.payload)
    }

    /// The payload as JSON text (without the identifier).
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }
}

impl<P> LogRecord<P> {
    pub const fn payload(&self) -> &P {
        &self.payload
    }

    pub const fn id(&self) -> &LogId {
        &self.id
    }

    /// The canonical timestamp encoded in the identifier.
    pub const fn timestamp(&self) -> Timestamp {
        self.id.timestamp()
    }

    /// Compares by identifier.
    pub fn identity_cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }

    /// Whether both records carry the same identifier.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.id == other.id
    }

    pub fn is_before(&self, timestamp: Timestamp) -> bool {
        self.timestamp() < timestamp
    }

    pub fn is_after(&self, timestamp: Timestamp) -> bool {
        self.timestamp() > timestamp
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P: PartialEq> PartialEq for LogRecord<P> {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

impl<P: Eq> Eq for LogRecord<P> {}

// Orders by identifier and so does not agree with `==`: equal payloads
// built through `from_parts` at different timestamps compare `Less`/`Greater`.
// There is no `Ord` impl for the same reason.
impl<P: PartialEq> PartialOrd for LogRecord<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.identity_cmp(other))
    }
}

/// Serializes as `{"id": ..., "data": ...}`.
impl<P: Serialize> Serialize for LogRecord<P> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("LogRecord", 2)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("data", &self.payload)?;
        state.end()
    }
}
