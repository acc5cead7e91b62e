//! Conversion of user-supplied points in time into zone-aware instants.
//!
//! Lookups and date options accept either ISO 8601 text or an already parsed
//! `chrono::DateTime` in any zone. Everything is normalized to
//! `DateTime<FixedOffset>` so the original offset stays available (daily
//! lookups use the calendar date in the caller's own offset).

use crate::MeteosourceError;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serializer;

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// `%#z` also takes hour-only offsets such as `+01`.
const OFFSET_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
];

/// Zone used for text that carries no offset of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NaiveAnchor {
    /// Wire timestamps: the API sends UTC without a `Z` suffix.
    Utc,
    /// Caller-supplied text without an offset.
    Local,
    /// Bare dates interpreted in the target zone (daily `day` field).
    Zone(Tz),
}

impl NaiveAnchor {
    fn resolve(self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            NaiveAnchor::Utc => Some(Utc.from_utc_datetime(&naive).fixed_offset()),
            NaiveAnchor::Local => resolve_in(&Local, naive),
            NaiveAnchor::Zone(tz) => resolve_in(&tz, naive),
        }
    }
}

// A local time inside a DST gap moves forward by an hour.
fn resolve_in<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            zone.from_local_datetime(&(naive + TimeDelta::hours(1)))
                .earliest()
        })
        .map(|dt| dt.fixed_offset())
}

/// Parses ISO 8601 text. Semantically invalid dates (February 30th) fail like
/// malformed text does.
pub(crate) fn parse_iso(
    text: &str,
    anchor: NaiveAnchor,
) -> Result<DateTime<FixedOffset>, MeteosourceError> {
    let trimmed = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }
    let with_offset = match trimmed.strip_suffix(['Z', 'z']) {
        Some(stripped) => format!("{stripped}+00:00"),
        None => trimmed.to_string(),
    };
    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&with_offset, fmt).ok())
    {
        return Ok(dt);
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        // Hour-only time, e.g. `2022-03-03T10`.
        .or_else(|| NaiveDateTime::parse_from_str(&format!("{trimmed}:00"), "%Y-%m-%dT%H:%M").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .and_then(|naive| anchor.resolve(naive))
        .ok_or_else(|| MeteosourceError::bad_datetime(text))
}

/// Resolves an optional IANA zone name, defaulting to UTC.
pub(crate) fn parse_timezone(name: Option<&str>) -> Result<Tz, MeteosourceError> {
    match name {
        None => Ok(Tz::UTC),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| MeteosourceError::BadTimezone(name.to_string())),
    }
}

pub(crate) fn serialize_instant<S: Serializer>(
    instant: &DateTime<Tz>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&instant.to_rfc3339())
}

/// Anything that can be resolved to a single zone-aware instant.
///
/// Text without an offset is read in the system's local zone. Text with a
/// `Z` suffix or an explicit offset keeps that offset.
///
/// # Examples
///
/// ```
/// use meteosource::AnyInstant;
/// use chrono::{TimeZone, Utc};
///
/// let from_text = "2022-03-03T10:00:00Z".to_instant().unwrap();
/// let from_chrono = Utc.with_ymd_and_hms(2022, 3, 3, 10, 0, 0).unwrap().to_instant().unwrap();
/// assert_eq!(from_text, from_chrono);
/// assert!("2022-02-30".to_instant().is_err());
/// ```
pub trait AnyInstant {
    fn to_instant(self) -> Result<DateTime<FixedOffset>, MeteosourceError>;
}

impl AnyInstant for &str {
    fn to_instant(self) -> Result<DateTime<FixedOffset>, MeteosourceError> {
        parse_iso(self, NaiveAnchor::Local)
    }
}

impl AnyInstant for String {
    fn to_instant(self) -> Result<DateTime<FixedOffset>, MeteosourceError> {
        self.as_str().to_instant()
    }
}

impl AnyInstant for &String {
    fn to_instant(self) -> Result<DateTime<FixedOffset>, MeteosourceError> {
        self.as_str().to_instant()
    }
}

impl<Z: TimeZone> AnyInstant for DateTime<Z> {
    fn to_instant(self) -> Result<DateTime<FixedOffset>, MeteosourceError> {
        Ok(self.fixed_offset())
    }
}

impl<Z: TimeZone> AnyInstant for &DateTime<Z> {
    fn to_instant(self) -> Result<DateTime<FixedOffset>, MeteosourceError> {
        Ok(self.fixed_offset())
    }
}
