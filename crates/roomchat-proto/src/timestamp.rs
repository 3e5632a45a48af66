//! Timestamp serialization.
//!
//! Timestamps are written as RFC 3339 strings. On input both RFC 3339 strings
//! and integer Unix milliseconds are accepted, since servers written against
//! JavaScript runtimes commonly emit either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

/// Wire representation of an inbound timestamp.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Serialize a timestamp as an RFC 3339 string.
pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339())
}

/// Deserialize a timestamp from an RFC 3339 string or Unix milliseconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(D::Error::custom),
    }
}
