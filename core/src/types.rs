//! Shared primitive types used across the entire core.

use chrono::{DateTime, TimeDelta, Utc};

/// A wall-clock instant. Every elapsed-time computation uses these.
pub type Timestamp = DateTime<Utc>;

/// The player-chosen identity of a save. Also the file-name prefix.
pub type Nickname = String;

/// Serde adapter persisting a `TimeDelta` as whole nanoseconds.
///
/// Nanoseconds keep the carried generation fraction exact across
/// save/load; the i64 range covers roughly 292 years either way.
pub mod duration_nanos {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = value
            .num_nanoseconds()
            .ok_or_else(|| serde::ser::Error::custom(format!("duration {value} overflows i64 nanoseconds")))?;
        serializer.serialize_i64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let nanos = i64::deserialize(deserializer)?;
        Ok(TimeDelta::nanoseconds(nanos))
    }
}

/// Build a `TimeDelta` from configuration milliseconds.
pub fn millis(ms: u64) -> TimeDelta {
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .unwrap_or(TimeDelta::MAX)
}

/// Current wall-clock time. Only `clock::SystemClock` should call this.
pub(crate) fn utc_now() -> Timestamp {
    Utc::now()
}
