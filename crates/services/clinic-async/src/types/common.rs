//! Shared wire helpers

use chrono::NaiveDateTime;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
// The backend drops zero seconds, and form inputs never send them.
const ACCEPTED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses a local date-time with or without seconds
#[must_use]
pub fn parse_local_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Serde adapter for backend `LocalDateTime` fields
pub mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes as `YYYY-MM-DDTHH:MM:SS`
    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(super::WIRE_FORMAT).to_string())
    }

    /// Accepts `YYYY-MM-DDTHH:MM[:SS[.fff]]`
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_local_datetime(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid local date-time: {raw}")))
    }

    /// Same adapter for optional fields
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serializes `None` as `null`
        pub fn serialize<S: Serializer>(
            dt: &Option<NaiveDateTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, s),
                None => s.serialize_none(),
            }
        }

        /// Treats `null` and empty strings as `None`
        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => crate::types::common::parse_local_datetime(&raw)
                    .map(Some)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid local date-time: {raw}"))
                    }),
            }
        }
    }
}

/// Reference to another entity by id, as nested in some payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdRef {
    /// Referenced entity id
    pub id: i64,
}
