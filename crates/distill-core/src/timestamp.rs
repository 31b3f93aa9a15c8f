//! Canonical timestamps and raw clock-unit normalization.
//!
//! Every ordering and windowing decision uses [`Timestamp`]: non-negative
//! milliseconds since the Unix epoch. Schemas convert whatever unit their
//! raw time field uses into this representation with [`TimeUnit`].

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Canonical timestamp in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Self = Self(0);

    /// Creates a timestamp from epoch milliseconds, rejecting negative values.
    pub fn from_millis(millis: i64) -> Result<Self, LogError> {
        u64::try_from(millis)
            .map(Self)
            .map_err(|_| LogError::timestamp(millis, "must not be negative"))
    }

    /// Creates a timestamp from epoch milliseconds, clamping negatives to the epoch.
    #[must_use]
    pub fn saturating_from_millis(millis: i64) -> Self {
        Self(u64::try_from(millis).unwrap_or(0))
    }

    /// Returns the value in epoch milliseconds.
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn saturating_add_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    #[must_use]
    pub const fn saturating_sub_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_sub(millis))
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is later.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Converts to a UTC datetime, if representable.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// Renders as RFC 3339 with millisecond precision, falling back to raw milliseconds.
    pub fn to_rfc3339(self) -> String {
        self.to_datetime().map_or_else(
            || self.0.to_string(),
            |dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }
}

impl From<u64> for Timestamp {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::saturating_from_millis(dt.timestamp_millis())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unit of a raw client-reported time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    #[default]
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Normalizes an integer raw time into a canonical timestamp.
    pub fn normalize(self, raw: i64) -> Result<Timestamp, LogError> {
        if raw < 0 {
            return Err(LogError::timestamp(raw, "must not be negative"));
        }
        let millis = match self {
            Self::Seconds => raw
                .checked_mul(1_000)
                .ok_or_else(|| LogError::timestamp(raw, "out of range"))?,
            Self::Milliseconds => raw,
            Self::Microseconds => raw / 1_000,
            Self::Nanoseconds => raw / 1_000_000,
        };
        Timestamp::from_millis(millis)
    }

    /// Normalizes a fractional raw time, truncating to whole milliseconds.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "range is checked before the cast"
    )]
    pub fn normalize_f64(self, raw: f64) -> Result<Timestamp, LogError> {
        if !raw.is_finite() {
            return Err(LogError::timestamp(raw, "must be a finite number"));
        }
        if raw < 0.0 {
            return Err(LogError::timestamp(raw, "must not be negative"));
        }
        let millis = match self {
            Self::Seconds => raw * 1_000.0,
            Self::Milliseconds => raw,
            Self::Microseconds => raw / 1_000.0,
            Self::Nanoseconds => raw / 1_000_000.0,
        };
        if millis >= u64::MAX as f64 {
            return Err(LogError::timestamp(raw, "out of range"));
        }
        Ok(Timestamp(millis.trunc() as u64))
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Seconds => "seconds",
            Self::Milliseconds => "milliseconds",
            Self::Microseconds => "microseconds",
            Self::Nanoseconds => "nanoseconds",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis_rejects_negative() {
        let err = Timestamp::from_millis(-1).unwrap_err();
        assert!(matches!(err, LogError::InvalidTimestamp { .. }));
        assert_eq!(Timestamp::from_millis(42).unwrap().millis(), 42);
    }

    #[test]
    fn test_saturating_constructors_and_arithmetic() {
        assert_eq!(Timestamp::saturating_from_millis(-10), Timestamp::EPOCH);
        let ts = Timestamp::from(5);
        assert_eq!(ts.saturating_sub_millis(10), Timestamp::EPOCH);
        assert_eq!(ts.saturating_add_millis(10).millis(), 15);
        assert_eq!(Timestamp::from(15).millis_since(ts), 10);
        assert_eq!(ts.millis_since(Timestamp::from(15)), 0);
    }

    #[test]
    fn test_rfc3339_rendering() {
        let ts = Timestamp::from(1_700_000_000_123);
        assert_eq!(ts.to_rfc3339(), "2023-11-14T22:13:20.123Z");
        assert_eq!(ts.to_string(), "1700000000123");
    }

    #[test]
    fn test_normalize_integer_units() {
        assert_eq!(TimeUnit::Seconds.normalize(2).unwrap().millis(), 2_000);
        assert_eq!(TimeUnit::Milliseconds.normalize(2).unwrap().millis(), 2);
        assert_eq!(TimeUnit::Microseconds.normalize(2_500).unwrap().millis(), 2);
        assert_eq!(TimeUnit::Nanoseconds.normalize(3_000_000).unwrap().millis(), 3);
        assert!(TimeUnit::Seconds.normalize(i64::MAX).is_err());
        assert!(TimeUnit::Milliseconds.normalize(-1).is_err());
    }

    #[test]
    fn test_normalize_fractional_units() {
        assert_eq!(TimeUnit::Seconds.normalize_f64(1.5).unwrap().millis(), 1_500);
        assert_eq!(TimeUnit::Milliseconds.normalize_f64(7.9).unwrap().millis(), 7);
        assert!(TimeUnit::Seconds.normalize_f64(f64::NAN).is_err());
        assert!(TimeUnit::Seconds.normalize_f64(-0.5).is_err());
    }

    #[test]
    fn test_time_unit_serde_names() {
        let json = serde_json::to_string(&TimeUnit::Seconds).unwrap();
        assert_eq!(json, "\"seconds\"");
        let parsed: TimeUnit = serde_json::from_str("\"nanoseconds\"").unwrap();
        assert_eq!(parsed, TimeUnit::Nanoseconds);
    }
}
