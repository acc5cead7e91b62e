//! Contains the `TimeSeries` wrapper used for the minutely, hourly and daily
//! forecast sections and for historical (time machine) data.

use crate::types::traits::any_instant::{parse_iso, serialize_instant, AnyInstant, NaiveAnchor};
use crate::MeteosourceError;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use log::debug;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Which kind of series a [`TimeSeries`] holds.
///
/// The kind decides the name of the temporal field on the wire, the
/// granularity of lookups and the wording of the descriptive label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    /// Minute-by-minute precipitation forecast, keyed by `date`.
    Minutely,
    /// Hour-by-hour forecast, keyed by `date`.
    Hourly,
    /// Day-by-day forecast, keyed by the bare date in `day`.
    Daily,
    /// Historical hourly data merged over all requested dates.
    TimeMachine,
}

impl SeriesKind {
    /// Name of the field that carries the timestamp on the wire.
    pub fn temporal_field(&self) -> &'static str {
        match self {
            SeriesKind::Daily => "day",
            _ => "date",
        }
    }

    fn wire_anchor(&self, tz: Tz) -> NaiveAnchor {
        match self {
            SeriesKind::Daily => NaiveAnchor::Zone(tz),
            _ => NaiveAnchor::Utc,
        }
    }

    /// Index key for a point in time, in the same truncated ISO form the API
    /// uses on the wire.
    fn lookup_key(&self, at: &DateTime<FixedOffset>) -> String {
        match self {
            SeriesKind::Minutely => at.with_timezone(&Utc).format("%Y-%m-%dT%H:%M:00"),
            SeriesKind::Hourly | SeriesKind::TimeMachine => {
                at.with_timezone(&Utc).format("%Y-%m-%dT%H:00:00")
            }
            SeriesKind::Daily => at.format("%Y-%m-%d"),
        }
        .to_string()
    }

    fn label(&self) -> (&'static str, &'static str) {
        match self {
            SeriesKind::Minutely => ("Minutely data", "timesteps"),
            SeriesKind::Hourly => ("Hourly data", "timesteps"),
            SeriesKind::Daily => ("Daily data", "steps"),
            SeriesKind::TimeMachine => ("TimeMachine data", "steps"),
        }
    }

    fn display_instant(&self, instant: &DateTime<Tz>) -> String {
        match self {
            SeriesKind::Daily => instant.format("%Y-%m-%d").to_string(),
            _ => instant.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// One step of a series: its converted timestamp plus the weather
/// attributes exactly as the API sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    field: &'static str,
    date: DateTime<Tz>,
    values: Map<String, Value>,
}

impl DataPoint {
    /// The timestamp of this step, converted to the requested zone.
    pub fn date(&self) -> &DateTime<Tz> {
        &self.date
    }

    /// Looks up a single attribute, e.g. `"temperature"` or `"weather"`.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// Numeric attribute shortcut. Nested objects (like `wind`) are reached
    /// with a `/`-separated path such as `"wind/speed"`.
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        let mut parts = path.split('/');
        let first = self.values.get(parts.next()?)?;
        parts
            .try_fold(first, |value, part| value.get(part))
            .and_then(Value::as_f64)
    }

    /// All attributes except the timestamp.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl Serialize for DataPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Instant<'a>(&'a DateTime<Tz>);
        impl Serialize for Instant<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_instant(self.0, serializer)
            }
        }

        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(self.field, &Instant(&self.date))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// An ordered series of [`DataPoint`]s with an index for point-in-time lookups.
///
/// The index is keyed by the literal wire timestamp (`YYYY-MM-DDTHH:MM:SS`
/// in UTC, or `YYYY-MM-DD` for daily data) and is built once, when the
/// series is created.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    kind: SeriesKind,
    summary: Option<String>,
    data: Vec<DataPoint>,
    index: HashMap<String, usize>,
}

impl TimeSeries {
    /// Converts raw API records, removing the temporal field from each one,
    /// recording it as the index key and replacing it with an instant in `tz`.
    pub(crate) fn from_wire(
        kind: SeriesKind,
        records: Vec<Map<String, Value>>,
        summary: Option<String>,
        tz: Tz,
    ) -> Result<Self, MeteosourceError> {
        let field = kind.temporal_field();
        let anchor = kind.wire_anchor(tz);
        let mut data = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for mut values in records {
            let wire = match values.remove(field) {
                Some(Value::String(text)) => text,
                Some(other) => return Err(MeteosourceError::bad_datetime(other.to_string())),
                None => {
                    return Err(MeteosourceError::MalformedResponse(format!(
                        "{kind:?} record without a '{field}' field"
                    )))
                }
            };
            let date = parse_iso(&wire, anchor)?.with_timezone(&tz);
            index.insert(wire, data.len());
            data.push(DataPoint {
                field,
                date,
                values,
            });
        }
        debug!("Indexed {} {:?} records in {}", data.len(), kind, tz);

        Ok(Self {
            kind,
            summary,
            data,
            index,
        })
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    /// Text summary the API attaches to some sections (minutely).
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// The data points in the order the API returned them.
    pub fn data(&self) -> &[DataPoint] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataPoint> {
        self.data.iter()
    }

    /// Finds the data point covering `at`.
    ///
    /// For minutely and hourly series `at` is moved to UTC and truncated to
    /// the start of its minute or hour. For daily series the calendar date of
    /// `at` in its own offset is used.
    ///
    /// # Errors
    ///
    /// Returns [`MeteosourceError::BadDateTime`] if `at` is text that cannot
    /// be parsed into a valid date.
    ///
    /// # Example
    ///
    /// ```
    /// # use meteosource::{Forecast, MeteosourceError};
    /// # fn main() -> Result<(), MeteosourceError> {
    /// let body = serde_json::json!({
    ///     "lat": "50.1N", "lon": "14.4E",
    ///     "hourly": {"data": [{"date": "2022-03-03T10:00:00", "temperature": 4.5}]}
    /// });
    /// let forecast = Forecast::from_response(body, Some("Europe/Prague"))?;
    /// let hourly = forecast.hourly.as_ref().unwrap();
    ///
    /// let point = hourly.get_data("2022-03-03T11:45:00+01:00")?.unwrap();
    /// assert_eq!(point.get_f64("temperature"), Some(4.5));
    /// assert!(hourly.get_data("2022-03-03T12:00:00Z")?.is_none());
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_data(&self, at: impl AnyInstant) -> Result<Option<&DataPoint>, MeteosourceError> {
        let key = self.kind.lookup_key(&at.to_instant()?);
        Ok(self.index.get(&key).map(|&position| &self.data[position]))
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a DataPoint;
    type IntoIter = std::slice::Iter<'a, DataPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl fmt::Display for TimeSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, unit) = self.kind.label();
        write!(f, "<{} with {} {}", name, self.data.len(), unit)?;
        if let (Some(first), Some(last)) = (self.data.first(), self.data.last()) {
            write!(
                f,
                " from {} to {}",
                self.kind.display_instant(&first.date),
                self.kind.display_instant(&last.date)
            )?;
        }
        write!(f, ">")
    }
}
