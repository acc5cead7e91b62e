//! Per-operation option structures.
//!
//! Options are normally assembled with the generated builders. They can also be
//! read from a JSON object with the camelCase keys of the public API (`placeId`,
//! `dateFrom`, `strictMode`, ...); unknown keys are rejected with
//! [`MeteosourceError::UnsupportedOption`].

use crate::types::traits::any_instant::AnyInstant;
use crate::MeteosourceError;
use bon::Builder;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Keys accepted by [`PointForecastOptions::from_value`].
pub const POINT_FORECAST_OPTIONS: [&str; 7] =
    ["lat", "lon", "placeId", "sections", "tz", "lang", "units"];

/// Option names of a time machine query. `progressFunc` can only be set
/// through the builder.
pub const TIME_MACHINE_OPTIONS: [&str; 10] = [
    "date",
    "dateFrom",
    "dateTo",
    "lat",
    "lon",
    "placeId",
    "tz",
    "units",
    "progressFunc",
    "strictMode",
];

const PROGRESS_OPTION: &str = "progressFunc";
const STRICT_MODE_OPTION: &str = "strictMode";

/// Rejects the first key of `options` that is not in `allowed`.
pub(crate) fn check_allowed_options(
    options: &Map<String, Value>,
    allowed: &[&str],
) -> Result<(), MeteosourceError> {
    match options.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(MeteosourceError::UnsupportedOption(key.clone())),
        None => Ok(()),
    }
}

fn options_object(value: Value, allowed: &[&str]) -> Result<Value, MeteosourceError> {
    match value {
        Value::Object(map) => {
            check_allowed_options(&map, allowed)?;
            Ok(Value::Object(map))
        }
        other => Err(MeteosourceError::InvalidOptions(format!(
            "options must be a JSON object, got {other}"
        ))),
    }
}

/// Latitude or longitude, forwarded to the API as given.
///
/// Accepts numbers (`50.08`) as well as the API's own notation (`"50.08N"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "CoordinateRepr")]
pub struct Coordinate(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinateRepr {
    Number(f64),
    Text(String),
}

impl From<CoordinateRepr> for Coordinate {
    fn from(repr: CoordinateRepr) -> Self {
        match repr {
            CoordinateRepr::Number(number) => number.into(),
            CoordinateRepr::Text(text) => Coordinate(text),
        }
    }
}

impl From<f64> for Coordinate {
    fn from(value: f64) -> Self {
        Coordinate(value.to_string())
    }
}

impl From<&str> for Coordinate {
    fn from(value: &str) -> Self {
        Coordinate(value.to_string())
    }
}

impl From<String> for Coordinate {
    fn from(value: String) -> Self {
        Coordinate(value)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Forecast sections to request, sent as one comma-separated value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "SectionsRepr")]
pub struct Sections(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum SectionsRepr {
    One(String),
    Many(Vec<String>),
}

impl From<SectionsRepr> for Sections {
    fn from(repr: SectionsRepr) -> Self {
        match repr {
            SectionsRepr::One(text) => Sections(text),
            SectionsRepr::Many(names) => Sections(names.join(",")),
        }
    }
}

impl From<&str> for Sections {
    fn from(value: &str) -> Self {
        Sections(value.to_string())
    }
}

impl From<String> for Sections {
    fn from(value: String) -> Self {
        Sections(value)
    }
}

impl<S: AsRef<str>> From<Vec<S>> for Sections {
    fn from(names: Vec<S>) -> Self {
        names.as_slice().into()
    }
}

impl<S: AsRef<str>> From<&[S]> for Sections {
    fn from(names: &[S]) -> Self {
        let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        Sections(names.join(","))
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for Sections {
    fn from(names: [S; N]) -> Self {
        names.as_slice().into()
    }
}

impl fmt::Display for Sections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single date given as ISO text, a calendar date, or a zoned datetime.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Text(String),
    Day(NaiveDate),
    Instant(DateTime<FixedOffset>),
}

impl DateInput {
    /// The calendar date this input names, read in its own offset.
    pub(crate) fn to_day(&self) -> Result<NaiveDate, MeteosourceError> {
        match self {
            DateInput::Text(text) => Ok(text.as_str().to_instant()?.date_naive()),
            DateInput::Day(day) => Ok(*day),
            DateInput::Instant(instant) => Ok(instant.date_naive()),
        }
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Text(value)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Day(value)
    }
}

impl<Z: TimeZone> From<DateTime<Z>> for DateInput {
    fn from(value: DateTime<Z>) -> Self {
        DateInput::Instant(value.fixed_offset())
    }
}

impl<'de> Deserialize<'de> for DateInput {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(DateInput::Text)
    }
}

/// One date or a list of dates for [`TimeMachineOptions::date`]. A list is
/// fetched as given, duplicates and order included.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "DatesRepr")]
pub struct Dates(Vec<DateInput>);

#[derive(Deserialize)]
#[serde(untagged)]
enum DatesRepr {
    One(DateInput),
    Many(Vec<DateInput>),
}

impl From<DatesRepr> for Dates {
    fn from(repr: DatesRepr) -> Self {
        match repr {
            DatesRepr::One(date) => Dates(vec![date]),
            DatesRepr::Many(dates) => Dates(dates),
        }
    }
}

impl Dates {
    pub fn as_slice(&self) -> &[DateInput] {
        &self.0
    }
}

macro_rules! single_date {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Dates {
                fn from(value: $t) -> Self {
                    Dates(vec![value.into()])
                }
            }
        )*
    };
}

single_date!(&str, String, NaiveDate, DateInput);

impl<Z: TimeZone> From<DateTime<Z>> for Dates {
    fn from(value: DateTime<Z>) -> Self {
        Dates(vec![value.into()])
    }
}

impl<T: Into<DateInput>> From<Vec<T>> for Dates {
    fn from(values: Vec<T>) -> Self {
        Dates(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<DateInput>, const N: usize> From<[T; N]> for Dates {
    fn from(values: [T; N]) -> Self {
        Dates(values.into_iter().map(Into::into).collect())
    }
}

/// Options of [`crate::Meteosource::get_point_forecast`].
///
/// Give either `lat` + `lon` or `place_id`; the API decides which wins.
///
/// # Examples
///
/// ```
/// use meteosource::PointForecastOptions;
///
/// let options = PointForecastOptions::builder()
///     .place_id("prague")
///     .sections(["current", "hourly"])
///     .tz("Europe/Prague")
///     .build();
/// assert_eq!(options.sections.unwrap().to_string(), "current,hourly");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Builder, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointForecastOptions {
    #[builder(into)]
    pub lat: Option<Coordinate>,
    #[builder(into)]
    pub lon: Option<Coordinate>,
    #[builder(into)]
    pub place_id: Option<String>,
    /// Sections to request, e.g. `"all"` or `["current", "hourly"]`.
    #[builder(into)]
    pub sections: Option<Sections>,
    /// IANA zone the returned dates are converted to. Defaults to UTC.
    /// The API itself is always queried in UTC.
    #[builder(into)]
    pub tz: Option<String>,
    #[builder(into)]
    pub lang: Option<String>,
    #[builder(into)]
    pub units: Option<String>,
}

impl PointForecastOptions {
    /// Reads options from a JSON object such as
    /// `{"placeId": "prague", "sections": ["hourly"], "tz": "Europe/Prague"}`.
    pub fn from_value(value: Value) -> Result<Self, MeteosourceError> {
        let object = options_object(value, &POINT_FORECAST_OPTIONS)?;
        serde_json::from_value(object).map_err(|e| MeteosourceError::InvalidOptions(e.to_string()))
    }
}

/// Called with the completed percentage (0-100) before each date's request
/// and once more with 100 when all dates are done.
pub type ProgressFn = Box<dyn FnMut(u8) + Send>;

/// Options of [`crate::Meteosource::get_time_machine`].
///
/// Exactly one of `date` or the pair `date_from` + `date_to` must be set.
///
/// # Examples
///
/// ```
/// use meteosource::TimeMachineOptions;
///
/// let range = TimeMachineOptions::builder()
///     .place_id("prague")
///     .date_from("2022-03-03")
///     .date_to("2022-03-05")
///     .strict_mode(false)
///     .build();
///
/// let some_days = TimeMachineOptions::builder()
///     .lat(50.08)
///     .lon(14.42)
///     .date(["2022-03-03", "2022-03-10"])
///     .progress(Box::new(|percent| println!("{percent}%")))
///     .build();
/// # let _ = (range, some_days);
/// ```
#[derive(Default, Builder, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeMachineOptions {
    #[builder(into)]
    pub date: Option<Dates>,
    #[builder(into)]
    pub date_from: Option<DateInput>,
    #[builder(into)]
    pub date_to: Option<DateInput>,
    #[builder(into)]
    pub lat: Option<Coordinate>,
    #[builder(into)]
    pub lon: Option<Coordinate>,
    #[builder(into)]
    pub place_id: Option<String>,
    #[builder(into)]
    pub tz: Option<String>,
    #[builder(into)]
    pub units: Option<String>,
    #[serde(skip)]
    pub progress: Option<ProgressFn>,
    /// Abort on the first failing date (default). With `false`, failing dates
    /// are skipped and reported by [`crate::TimeMachine::failed_dates`].
    pub strict_mode: Option<bool>,
}

impl TimeMachineOptions {
    /// Reads options from a JSON object such as
    /// `{"placeId": "prague", "dateFrom": "2022-03-03", "dateTo": "2022-03-05"}`.
    pub fn from_value(value: Value) -> Result<Self, MeteosourceError> {
        let object = options_object(value, &TIME_MACHINE_OPTIONS)?;
        if object.get(PROGRESS_OPTION).is_some() {
            return Err(MeteosourceError::InvalidOptions(format!(
                "'{PROGRESS_OPTION}' must be set through the builder"
            )));
        }
        // A `strictMode` key that is present but null selects lenient mode.
        let null_strict_mode = object.get(STRICT_MODE_OPTION) == Some(&Value::Null);
        let mut options: Self = serde_json::from_value(object)
            .map_err(|e| MeteosourceError::InvalidOptions(e.to_string()))?;
        if null_strict_mode {
            options.strict_mode = Some(false);
        }
        Ok(options)
    }
}

impl fmt::Debug for TimeMachineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeMachineOptions")
            .field("date", &self.date)
            .field("date_from", &self.date_from)
            .field("date_to", &self.date_to)
            .field("lat", &self.lat)
            .field("lon", &self.lon)
            .field("place_id", &self.place_id)
            .field("tz", &self.tz)
            .field("units", &self.units)
            .field("progress", &self.progress.as_ref().map(|_| "FnMut(u8)"))
            .field("strict_mode", &self.strict_mode)
            .finish()
    }
}
