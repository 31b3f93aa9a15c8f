//! Deterministic, time-sortable log identifiers.
//!
//! An identifier is `log_<timestamp>_<digest>` where `<timestamp>` is the
//! canonical timestamp as 16 lowercase hex digits and `<digest>` is the
//! SHA-256 of the payload's canonical JSON as 64 lowercase hex digits. Both
//! parts are fixed width, so comparing identifiers as strings gives the same
//! order as comparing `(timestamp, digest)`.
//!
//! # Canonical JSON
//!
//! - object keys sorted by UTF-8 byte order, recursively
//! - no insignificant whitespace
//!
//! The digest input is prefixed with [`HASH_VERSION`] so that a future change
//! to the canonical form produces disjoint identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

use crate::error::LogError;
use crate::timestamp::Timestamp;

/// Namespace prefix shared by every log identifier.
pub const ID_PREFIX: &str = "log_";

/// Version tag mixed into every digest.
pub const HASH_VERSION: &str = "distill.log.v1";

const TIMESTAMP_HEX_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

/// SHA-256 digest of a payload's canonical JSON.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; DIGEST_LEN]);

impl ContentDigest {
    /// Digests already-canonical bytes under the current hash version.
    #[must_use]
    pub fn of_canonical(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(HASH_VERSION.as_bytes());
        hasher.update([0u8]);
        hasher.update(bytes);
        let out = hasher.finalize();
        let mut buf = [0u8; DIGEST_LEN];
        buf.copy_from_slice(&out);
        Self(buf)
    }

    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    fn from_hex(s: &str) -> Option<Self> {
        if s.len() != DIGEST_LEN * 2 {
            return None;
        }
        let mut buf = [0u8; DIGEST_LEN];
        for (i, byte) in buf.iter_mut().enumerate() {
            let pair = s.get(i * 2..i * 2 + 2)?;
            if !is_lower_hex(pair) {
                return None;
            }
            *byte = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(Self(buf))
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({self})")
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// A unique, lexicographically time-sortable log identifier.
///
/// The derived ordering compares the timestamp first and the digest second,
/// which matches the byte order of the rendered string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogId {
    timestamp: Timestamp,
    digest: ContentDigest,
}

impl LogId {
    pub const fn new(timestamp: Timestamp, digest: ContentDigest) -> Self {
        Self { timestamp, digest }
    }

    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub const fn digest(&self) -> &ContentDigest {
        &self.digest
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ID_PREFIX}{:0width$x}_{}",
            self.timestamp.millis(),
            self.digest,
            width = TIMESTAMP_HEX_LEN
        )
    }
}

/// Error returned when a string is not a well-formed [`LogId`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed log id `{0}`")]
pub struct ParseLogIdError(String);

impl FromStr for LogId {
    type Err = ParseLogIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseLogIdError(s.to_string());
        let rest = s.strip_prefix(ID_PREFIX).ok_or_else(malformed)?;
        let (ts_hex, digest_hex) = rest.split_once('_').ok_or_else(malformed)?;
        if ts_hex.len() != TIMESTAMP_HEX_LEN || !is_lower_hex(ts_hex) {
            return Err(malformed());
        }
        let millis = u64::from_str_radix(ts_hex, 16).map_err(|_| malformed())?;
        let digest = ContentDigest::from_hex(digest_hex).ok_or_else(malformed)?;
        Ok(Self::new(Timestamp::from(millis), digest))
    }
}

impl Serialize for LogId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LogId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serializes a value to canonical JSON bytes.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    serde_json::to_vec(&canon_value(value))
}

fn canon_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k, canon_value(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canon_value).collect()),
        other => other,
    }
}

/// Assigns an identifier to a validated payload observed at `timestamp`.
///
/// Byte-identical payload content always yields the same digest, and the
/// identifier order follows `timestamp` regardless of the digest.
pub fn assign<P: Serialize>(payload: &P, timestamp: Timestamp) -> Result<LogId, LogError> {
    let bytes = to_canonical_json(payload)
        .map_err(|e| LogError::record(format!("payload cannot be serialized: {e}")))?;
    Ok(LogId::new(timestamp, ContentDigest::of_canonical(&bytes)))
}
