//! Serde adapter for `created_at`.
//!
//! Writes RFC 3339. Reads RFC 3339 strings or epoch milliseconds, since both
//! shapes exist in stored snapshots.

use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    EpochMillis(i64),
}

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(text) => {
            OffsetDateTime::parse(text.trim(), &Rfc3339).map_err(serde::de::Error::custom)
        }
        RawTimestamp::EpochMillis(millis) => {
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
                .map_err(serde::de::Error::custom)
        }
    }
}
