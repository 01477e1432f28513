// crates/identity-runtime-core/src/time.rs
// ============================================================================
// Module: Identity Runtime Time Model
// Description: Canonical ISO-8601 UTC timestamps for records and reports.
// Purpose: Provide one serialization shape for every persisted time value.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Every persisted timestamp in the identity runtime is ISO-8601 UTC with a
//! `Z` suffix and second precision, e.g. `2026-02-22T09:40:00Z`. Parsing
//! accepts any RFC 3339 offset and normalizes to UTC. Components that need
//! "now" receive it as an explicit argument; only the CLI boundary reads the
//! wall clock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use thiserror::Error;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Format
// ============================================================================

/// Canonical render format: second precision, literal `Z` suffix.
const RENDER_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Date-only stamp used in mirrored report file names.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when parsing or rendering timestamps.
#[derive(Debug, Error)]
pub enum TimeError {
    /// The input string is not a valid RFC 3339 timestamp.
    #[error("invalid timestamp {value:?}: {reason}")]
    Parse {
        /// Offending input value.
        value: String,
        /// Parser failure description.
        reason: String,
    },
    /// A unix timestamp was outside the representable range.
    #[error("unix timestamp out of range: {0}")]
    OutOfRange(i64),
    /// Rendering failed (component out of range for the format).
    #[error("failed to render timestamp: {0}")]
    Render(String),
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical UTC timestamp.
///
/// # Invariants
/// - Always stored in UTC; offsets are normalized on parse.
/// - Serializes with second precision and a `Z` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Returns the current wall-clock time in UTC.
    ///
    /// Only CLI boundaries should call this; engine components take `now` as
    /// an explicit input so validation stays replayable.
    #[must_use]
    pub fn now_utc() -> Self {
        Self(OffsetDateTime::now_utc().replace_nanosecond(0).unwrap_or(OffsetDateTime::UNIX_EPOCH))
    }

    /// Creates a timestamp from unix seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] when the value is unrepresentable.
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, TimeError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(Self)
            .map_err(|_| TimeError::OutOfRange(seconds))
    }

    /// Returns the timestamp as unix seconds.
    #[must_use]
    pub const fn unix_seconds(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Parses an RFC 3339 timestamp and normalizes it to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::Parse`] when the input is malformed.
    pub fn parse(value: &str) -> Result<Self, TimeError> {
        OffsetDateTime::parse(value, &Rfc3339)
            .map(|parsed| Self(parsed.to_offset(time::UtcOffset::UTC)))
            .map_err(|err| TimeError::Parse {
                value: value.to_string(),
                reason: err.to_string(),
            })
    }

    /// Renders the canonical `YYYY-MM-DDTHH:MM:SSZ` form.
    #[must_use]
    pub fn render(&self) -> String {
        self.0.format(RENDER_FORMAT).unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
    }

    /// Renders the date-only `YYYY-MM-DD` stamp.
    #[must_use]
    pub fn date_stamp(&self) -> String {
        self.0.format(DATE_FORMAT).unwrap_or_else(|_| String::from("1970-01-01"))
    }

    /// Returns the age of this timestamp relative to `now`, in whole days.
    ///
    /// Negative ages indicate a timestamp in the future.
    #[must_use]
    pub fn age_days(&self, now: Self) -> i64 {
        (now.0 - self.0).whole_days()
    }

    /// Returns the signed difference `self - other` in seconds.
    #[must_use]
    pub fn seconds_since(&self, other: Self) -> i64 {
        (self.0 - other.0).whole_seconds()
    }

    /// Returns a timestamp shifted back by the given number of hours.
    #[must_use]
    pub fn minus_hours(&self, hours: i64) -> Self {
        Self(self.0 - Duration::hours(hours))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}
