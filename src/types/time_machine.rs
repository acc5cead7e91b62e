//! The enriched result of a historical (time machine) query.

use crate::types::forecast::{coordinate_text, null_as_empty};
use crate::types::time_series::{DataPoint, SeriesKind, TimeSeries};
use crate::types::traits::any_instant::{parse_timezone, AnyInstant};
use crate::MeteosourceError;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Deserialize)]
pub(crate) struct WireTimeMachine {
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lon: Value,
    elevation: Option<f64>,
    timezone: Option<String>,
    units: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub(crate) data: Vec<Map<String, Value>>,
}

impl WireTimeMachine {
    pub(crate) fn from_body(body: Value, date: NaiveDate) -> Result<Self, MeteosourceError> {
        serde_json::from_value(body).map_err(|e| {
            MeteosourceError::MalformedResponse(format!("time machine data for {date}: {e}"))
        })
    }
}

/// A date whose request failed while loading a range in non-strict mode.
#[derive(Debug, Clone)]
pub struct DateFailure {
    pub date: NaiveDate,
    pub error: MeteosourceError,
}

/// Historical hourly data for one or more days, merged in request order.
#[derive(Debug, Clone)]
pub struct TimeMachine {
    pub lat: String,
    pub lon: String,
    pub elevation: Option<f64>,
    pub timezone: Option<String>,
    pub units: Option<String>,
    data: TimeSeries,
    failures: Vec<DateFailure>,
}

impl TimeMachine {
    /// Enriches a raw `/time_machine` response body obtained elsewhere.
    ///
    /// `tz` is an IANA zone name; `None` means UTC.
    pub fn from_response(body: Value, tz: Option<&str>) -> Result<Self, MeteosourceError> {
        let tz = parse_timezone(tz)?;
        let wire: WireTimeMachine = serde_json::from_value(body)
            .map_err(|e| MeteosourceError::MalformedResponse(format!("time machine: {e}")))?;
        Self::enrich(wire, tz, Vec::new())
    }

    pub(crate) fn enrich(
        wire: WireTimeMachine,
        tz: Tz,
        failures: Vec<DateFailure>,
    ) -> Result<Self, MeteosourceError> {
        Ok(Self {
            lat: coordinate_text(&wire.lat),
            lon: coordinate_text(&wire.lon),
            elevation: wire.elevation,
            timezone: wire.timezone,
            units: wire.units,
            data: TimeSeries::from_wire(SeriesKind::TimeMachine, wire.data, None, tz)?,
            failures,
        })
    }

    /// All hourly steps of every successfully loaded date.
    pub fn data(&self) -> &TimeSeries {
        &self.data
    }

    /// Finds the hour covering `at`. See [`TimeSeries::get_data`].
    pub fn get_data(&self, at: impl AnyInstant) -> Result<Option<&DataPoint>, MeteosourceError> {
        self.data.get_data(at)
    }

    /// Dates that were skipped because their request failed, in request order.
    pub fn failed_dates(&self) -> Vec<NaiveDate> {
        self.failures.iter().map(|failure| failure.date).collect()
    }

    /// The skipped dates together with the error each one failed with.
    pub fn failures(&self) -> &[DateFailure] {
        &self.failures
    }
}

impl fmt::Display for TimeMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<TimeMachine for lat: {}, lon: {}>", self.lat, self.lon)
    }
}
