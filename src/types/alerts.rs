use crate::types::traits::any_instant::{parse_iso, serialize_instant, AnyInstant, NaiveAnchor};
use crate::MeteosourceError;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// A weather alert issued for the forecast location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// When the alert starts, in the requested zone.
    #[serde(serialize_with = "serialize_instant")]
    pub onset: DateTime<Tz>,
    /// When the alert ends, in the requested zone.
    #[serde(serialize_with = "serialize_instant")]
    pub expires: DateTime<Tz>,
    /// Remaining alert attributes (`event`, `sender`, `regions`, ...).
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Alert {
    fn from_wire(mut details: Map<String, Value>, tz: Tz) -> Result<Self, MeteosourceError> {
        let onset = take_instant(&mut details, "onset", tz)?;
        let expires = take_instant(&mut details, "expires", tz)?;
        Ok(Self {
            onset,
            expires,
            details,
        })
    }

    /// The `event` description, e.g. "Strong wind".
    pub fn event(&self) -> Option<&str> {
        self.details.get("event").and_then(Value::as_str)
    }

    /// `onset <= at <= expires`.
    pub fn is_active_at(&self, at: &DateTime<FixedOffset>) -> bool {
        let at = at.with_timezone(&Utc);
        self.onset.with_timezone(&Utc) <= at && at <= self.expires.with_timezone(&Utc)
    }
}

fn take_instant(
    details: &mut Map<String, Value>,
    field: &str,
    tz: Tz,
) -> Result<DateTime<Tz>, MeteosourceError> {
    match details.remove(field) {
        Some(Value::String(text)) => Ok(parse_iso(&text, NaiveAnchor::Utc)?.with_timezone(&tz)),
        Some(other) => Err(MeteosourceError::bad_datetime(other.to_string())),
        None => Err(MeteosourceError::MalformedResponse(format!(
            "alert without an '{field}' field"
        ))),
    }
}

/// The alerts section of a forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct Alerts {
    data: Vec<Alert>,
}

impl Alerts {
    pub(crate) fn from_wire(
        records: Vec<Map<String, Value>>,
        tz: Tz,
    ) -> Result<Self, MeteosourceError> {
        let data = records
            .into_iter()
            .map(|record| Alert::from_wire(record, tz))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { data })
    }

    pub fn data(&self) -> &[Alert] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Alerts in force right now.
    pub fn active_alerts(&self) -> Vec<&Alert> {
        let now = Utc::now().fixed_offset();
        self.data.iter().filter(|alert| alert.is_active_at(&now)).collect()
    }

    /// Alerts in force at `at`, both ends of each alert's range included.
    ///
    /// # Errors
    ///
    /// Returns [`MeteosourceError::BadDateTime`] if `at` cannot be parsed.
    pub fn active_alerts_at(&self, at: impl AnyInstant) -> Result<Vec<&Alert>, MeteosourceError> {
        let at = at.to_instant()?;
        Ok(self.data.iter().filter(|alert| alert.is_active_at(&at)).collect())
    }
}

impl fmt::Display for Alerts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Alerts ({} alerts available)>", self.data.len())
    }
}
