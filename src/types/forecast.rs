//! The enriched point forecast and the wire shapes it is decoded from.

use crate::types::alerts::Alerts;
use crate::types::time_series::{SeriesKind, TimeSeries};
use crate::types::traits::any_instant::parse_timezone;
use crate::MeteosourceError;
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Deserialize)]
struct WireSection {
    #[serde(default, deserialize_with = "null_as_empty")]
    data: Vec<Map<String, Value>>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireForecast {
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lon: Value,
    elevation: Option<f64>,
    timezone: Option<String>,
    units: Option<String>,
    current: Option<Map<String, Value>>,
    minutely: Option<WireSection>,
    hourly: Option<WireSection>,
    daily: Option<WireSection>,
    alerts: Option<WireSection>,
}

/// `"data": null` reads as an empty list.
pub(crate) fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Map<String, Value>>, D::Error> {
    Ok(Option::<Vec<Map<String, Value>>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Coordinates come back as text like `"50.08804N"`; numbers are tolerated.
pub(crate) fn coordinate_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Current conditions. There are no timestamps to convert here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Current {
    values: Map<String, Value>,
}

impl Current {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl fmt::Display for Current {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Current data>")
    }
}

/// A point forecast with every timestamp converted to the requested zone.
///
/// Sections the API did not return (or returned as `null`) are `None`.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub lat: String,
    pub lon: String,
    pub elevation: Option<f64>,
    /// Zone the API reported. Always UTC, the client asks for it.
    pub timezone: Option<String>,
    pub units: Option<String>,
    pub current: Option<Current>,
    pub minutely: Option<TimeSeries>,
    pub hourly: Option<TimeSeries>,
    pub daily: Option<TimeSeries>,
    pub alerts: Option<Alerts>,
}

impl Forecast {
    /// Enriches a raw `/point` response body obtained elsewhere.
    ///
    /// `tz` is an IANA zone name; `None` means UTC.
    pub fn from_response(body: Value, tz: Option<&str>) -> Result<Self, MeteosourceError> {
        Self::enrich(body, parse_timezone(tz)?)
    }

    pub(crate) fn enrich(body: Value, tz: Tz) -> Result<Self, MeteosourceError> {
        let wire: WireForecast = serde_json::from_value(body)
            .map_err(|e| MeteosourceError::MalformedResponse(format!("point forecast: {e}")))?;

        let series = |kind, section: Option<WireSection>| {
            section
                .map(|section| TimeSeries::from_wire(kind, section.data, section.summary, tz))
                .transpose()
        };

        Ok(Self {
            lat: coordinate_text(&wire.lat),
            lon: coordinate_text(&wire.lon),
            elevation: wire.elevation,
            timezone: wire.timezone,
            units: wire.units,
            current: wire.current.map(|values| Current { values }),
            minutely: series(SeriesKind::Minutely, wire.minutely)?,
            hourly: series(SeriesKind::Hourly, wire.hourly)?,
            daily: series(SeriesKind::Daily, wire.daily)?,
            alerts: wire
                .alerts
                .map(|section| Alerts::from_wire(section.data, tz))
                .transpose()?,
        })
    }
}

impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Forecast for lat: {}, lon: {}>", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_forecast() -> Value {
        json!({
            "lat": "50.08804N",
            "lon": "14.42076E",
            "elevation": 202,
            "timezone": "UTC",
            "units": "metric",
            "current": {"icon": "cloudy", "temperature": 4.2},
            "minutely": {
                "summary": "No precipitation expected.",
                "data": [
                    {"date": "2022-03-03T10:15:00", "precipitation": 0.0},
                    {"date": "2022-03-03T10:16:00", "precipitation": 0.0},
                ]
            },
            "hourly": {"data": [
                {"date": "2022-03-03T10:00:00", "temperature": 4.0, "wind": {"speed": 3.1}},
                {"date": "2022-03-03T11:00:00", "temperature": 5.0, "wind": {"speed": 2.4}},
            ]},
            "daily": {"data": [
                {"day": "2022-03-03", "weather": "cloudy"},
                {"day": "2022-03-04", "weather": "sunny"},
            ]},
            "alerts": {"data": [
                {"event": "Fog", "onset": "2022-03-03T06:00:00", "expires": "2022-03-03T11:00:00"},
            ]}
        })
    }

    #[test]
    fn test_every_section_uses_utc_by_default() {
        let forecast = Forecast::from_response(sample_forecast(), None).unwrap();
        let sections = [&forecast.minutely, &forecast.hourly, &forecast.daily];
        for series in sections.into_iter().map(|s| s.as_ref().unwrap()) {
            assert!(series.iter().all(|p| p.date().timezone() == Tz::UTC), "{series}");
        }
        let alert = &forecast.alerts.as_ref().unwrap().data()[0];
        assert_eq!(alert.onset.timezone(), Tz::UTC);
    }

    #[test]
    fn test_every_section_uses_requested_zone() {
        let forecast = Forecast::from_response(sample_forecast(), Some("Europe/Prague")).unwrap();
        let prague = chrono_tz::Europe::Prague;
        let sections = [&forecast.minutely, &forecast.hourly, &forecast.daily];
        for series in sections.into_iter().map(|s| s.as_ref().unwrap()) {
            assert!(series.iter().all(|p| p.date().timezone() == prague), "{series}");
        }
        let alert = &forecast.alerts.as_ref().unwrap().data()[0];
        assert_eq!(alert.expires.timezone(), prague);
    }

    #[test]
    fn test_labels() {
        let forecast = Forecast::from_response(sample_forecast(), Some("Europe/Prague")).unwrap();
        assert_eq!(forecast.to_string(), "<Forecast for lat: 50.08804N, lon: 14.42076E>");
        assert_eq!(forecast.current.as_ref().unwrap().to_string(), "<Current data>");
        assert_eq!(
            forecast.hourly.as_ref().unwrap().to_string(),
            "<Hourly data with 2 timesteps from 2022-03-03T11:00:00 to 2022-03-03T12:00:00>"
        );
        assert_eq!(
            forecast.daily.as_ref().unwrap().to_string(),
            "<Daily data with 2 steps from 2022-03-03 to 2022-03-04>"
        );
        assert_eq!(
            forecast.minutely.as_ref().unwrap().to_string(),
            "<Minutely data with 2 timesteps from 2022-03-03T11:15:00 to 2022-03-03T11:16:00>"
        );
    }

    #[test]
    fn test_null_and_missing_sections_are_none() {
        let body = json!({"lat": 50.0, "lon": 14.5, "hourly": null, "daily": {"data": []}});
        let forecast = Forecast::from_response(body, None).unwrap();
        assert!(forecast.hourly.is_none());
        assert!(forecast.minutely.is_none());
        assert!(forecast.current.is_none());
        assert!(forecast.alerts.is_none());
        assert!(forecast.daily.unwrap().is_empty());
        assert_eq!(forecast.lat, "50.0");
    }

    #[test]
    fn test_null_section_data_is_empty() {
        let body = json!({
            "lat": "50.08804N",
            "lon": "14.42076E",
            "hourly": {"data": null},
            "alerts": {"data": null},
            "daily": {"data": [{"day": "2022-03-03", "weather": "cloudy"}]}
        });
        let forecast = Forecast::from_response(body, None).unwrap();
        assert!(forecast.hourly.unwrap().is_empty());
        assert!(forecast.alerts.unwrap().is_empty());
        assert_eq!(forecast.daily.unwrap().len(), 1);
    }

    #[test]
    fn test_current_and_nested_values() {
        let forecast = Forecast::from_response(sample_forecast(), None).unwrap();
        let current = forecast.current.unwrap();
        assert_eq!(current.get("icon"), Some(&json!("cloudy")));
        let hourly = forecast.hourly.unwrap();
        let point = hourly.get_data("2022-03-03T11:30:00Z").unwrap().unwrap();
        assert_eq!(point.get_f64("wind/speed"), Some(2.4));
    }

    #[test]
    fn test_unknown_zone_is_rejected() {
        assert!(matches!(
            Forecast::from_response(sample_forecast(), Some("Europe/Atlantis")),
            Err(MeteosourceError::BadTimezone(_))
        ));
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        assert!(matches!(
            Forecast::from_response(json!(["not", "a", "forecast"]), None),
            Err(MeteosourceError::MalformedResponse(_))
        ));
    }
}
