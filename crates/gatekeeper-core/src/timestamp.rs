// crates/gatekeeper-core/src/timestamp.rs
// ============================================================================
// Module: Timestamp
// Description: RFC 3339 wall-clock timestamp used by catalog rows.
// Purpose: Give `created_at`/`updated_at` a single serialization format.
// Dependencies: time, serde
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Server-side wall-clock timestamp, always UTC, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Wraps a raw `OffsetDateTime`, normalizing it to UTC.
    #[must_use]
    pub fn new(value: OffsetDateTime) -> Self {
        Self(value.to_offset(time::UtcOffset::UTC))
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }

    /// Returns the wrapped `OffsetDateTime`.
    #[must_use]
    pub const fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    /// Parses an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns an error when `raw` is not a valid RFC 3339 timestamp.
    pub fn parse(raw: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(raw, &Rfc3339).map(Self::new)
    }

    /// Formats the timestamp as an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns an error when formatting fails (never happens for valid
    /// `OffsetDateTime` values in practice).
    pub fn to_rfc3339(&self) -> Result<String, time::error::Format> {
        self.0.format(&Rfc3339)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = self.to_rfc3339().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
