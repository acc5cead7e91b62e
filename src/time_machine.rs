//! Date resolution and the sequential per-date loop behind
//! [`crate::Meteosource::get_time_machine`].

use crate::options::{DateInput, Dates, ProgressFn};
use crate::request::{ApiRequester, QueryParams};
use crate::types::time_machine::{DateFailure, WireTimeMachine};
use crate::MeteosourceError;
use chrono::NaiveDate;
use log::{info, warn};

pub(crate) const TIME_MACHINE_ENDPOINT: &str = "/time_machine";

/// Turns the date options into the ordered list of days to fetch.
///
/// Either `date` (taken verbatim, duplicates included) or both `date_from` and
/// `date_to` (every day in between, inclusive) must be given.
pub(crate) fn resolve_dates(
    date: Option<Dates>,
    date_from: Option<DateInput>,
    date_to: Option<DateInput>,
) -> Result<Vec<NaiveDate>, MeteosourceError> {
    let days = match (date, date_from, date_to) {
        (Some(dates), None, None) => dates
            .as_slice()
            .iter()
            .map(DateInput::to_day)
            .collect::<Result<Vec<_>, _>>()?,
        (None, Some(from), Some(to)) => {
            let from = from.to_day()?;
            let to = to.to_day()?;
            if from > to {
                return Err(MeteosourceError::InvalidOptions(
                    "dateFrom must be lower or equal to dateTo".to_string(),
                ));
            }
            from.iter_days().take_while(|day| *day <= to).collect()
        }
        _ => {
            return Err(MeteosourceError::InvalidOptions(
                "either date, or dateFrom+dateTo parameters must be specified".to_string(),
            ))
        }
    };
    if days.is_empty() {
        return Err(MeteosourceError::InvalidOptions(
            "no dates range to load".to_string(),
        ));
    }
    Ok(days)
}

/// Completed share of `total`, rounded to whole percent.
pub(crate) fn progress_percent(done: usize, total: usize) -> u8 {
    ((done as f64 / total as f64) * 100.0).round() as u8
}

/// Successful responses merged in request order, plus the dates that failed.
#[derive(Debug, Default)]
struct RangeAccumulator {
    merged: Option<WireTimeMachine>,
    failures: Vec<DateFailure>,
}

impl RangeAccumulator {
    fn record_success(&mut self, response: WireTimeMachine) {
        match &mut self.merged {
            None => self.merged = Some(response),
            Some(merged) => merged.data.extend(response.data),
        }
    }

    fn record_failure(&mut self, date: NaiveDate, error: MeteosourceError) {
        self.failures.push(DateFailure { date, error });
    }

    /// Fails with the last recorded error when no date succeeded.
    fn finish(mut self) -> Result<(WireTimeMachine, Vec<DateFailure>), MeteosourceError> {
        match self.merged {
            Some(merged) => Ok((merged, self.failures)),
            None => Err(self.failures.pop().map_or_else(
                || MeteosourceError::InvalidOptions("no dates range to load".to_string()),
                |failure| failure.error,
            )),
        }
    }
}

/// Location and unit parameters shared by every per-date request.
#[derive(Debug, Clone)]
pub(crate) struct RangeQuery {
    pub(crate) lat: Option<String>,
    pub(crate) lon: Option<String>,
    pub(crate) place_id: Option<String>,
    pub(crate) units: Option<String>,
}

impl RangeQuery {
    fn params(&self, date: NaiveDate) -> [(&'static str, Option<String>); 6] {
        [
            ("date", Some(date.format("%Y-%m-%d").to_string())),
            ("lat", self.lat.clone()),
            ("lon", self.lon.clone()),
            ("place_id", self.place_id.clone()),
            ("timezone", Some("utc".to_string())),
            ("units", self.units.clone()),
        ]
    }
}

async fn fetch_day(
    requester: &ApiRequester,
    params: &QueryParams,
    date: NaiveDate,
) -> Result<WireTimeMachine, MeteosourceError> {
    let body = requester
        .compose_request(TIME_MACHINE_ENDPOINT, params)
        .await?;
    WireTimeMachine::from_body(body, date)
}

/// Requests every date strictly one after another.
///
/// In strict mode the first failure is returned immediately. Otherwise failing
/// dates are recorded and skipped; the call only fails if no date succeeded.
pub(crate) async fn load_range(
    requester: &ApiRequester,
    query: &RangeQuery,
    dates: Vec<NaiveDate>,
    strict: bool,
    mut progress: Option<ProgressFn>,
) -> Result<(WireTimeMachine, Vec<DateFailure>), MeteosourceError> {
    let total = dates.len();
    info!(
        "Loading time machine data for {} date(s) ({} mode)",
        total,
        if strict { "strict" } else { "lenient" }
    );

    let mut accumulator = RangeAccumulator::default();
    for (done, date) in dates.into_iter().enumerate() {
        if let Some(report) = progress.as_mut() {
            report(progress_percent(done, total));
        }
        match fetch_day(requester, &query.params(date), date).await {
            Ok(response) => accumulator.record_success(response),
            Err(error) if strict => return Err(error),
            Err(error) => {
                warn!("Skipping {}: {}", date, error);
                accumulator.record_failure(date, error);
            }
        }
    }
    if let Some(report) = progress.as_mut() {
        report(100);
    }

    let (merged, failures) = accumulator.finish()?;
    info!(
        "Loaded {} hourly records, {} date(s) failed",
        merged.data.len(),
        failures.len()
    );
    Ok((merged, failures))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_range_is_inclusive() {
        let days = resolve_dates(None, Some("2022-03-03".into()), Some("2022-03-05".into())).unwrap();
        assert_eq!(days, vec![day("2022-03-03"), day("2022-03-04"), day("2022-03-05")]);

        let single = resolve_dates(None, Some("2022-03-03".into()), Some("2022-03-03".into())).unwrap();
        assert_eq!(single, vec![day("2022-03-03")]);
    }

    #[test]
    fn test_range_crosses_dst_and_month_ends() {
        let days = resolve_dates(None, Some("2022-03-26".into()), Some("2022-04-02".into())).unwrap();
        assert_eq!(days.len(), 8);
        assert_eq!(days.last(), Some(&day("2022-04-02")));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let err = resolve_dates(None, Some("2022-03-05".into()), Some("2022-03-03".into())).unwrap_err();
        assert!(matches!(err, MeteosourceError::InvalidOptions(_)));
    }

    #[test]
    fn test_date_list_is_taken_verbatim() {
        let days = resolve_dates(
            Some(vec!["2022-03-04", "2022-03-03", "2022-03-04"].into()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(days, vec![day("2022-03-04"), day("2022-03-03"), day("2022-03-04")]);
    }

    #[test]
    fn test_mode_combinations_are_exclusive() {
        let invalid = [
            resolve_dates(None, None, None),
            resolve_dates(Some("2022-03-03".into()), Some("2022-03-03".into()), Some("2022-03-04".into())),
            resolve_dates(Some("2022-03-03".into()), Some("2022-03-03".into()), None),
            resolve_dates(None, Some("2022-03-03".into()), None),
            resolve_dates(None, None, Some("2022-03-03".into())),
            resolve_dates(Some(Vec::<&str>::new().into()), None, None),
        ];
        for result in invalid {
            assert!(matches!(result, Err(MeteosourceError::InvalidOptions(_))), "{result:?}");
        }
    }

    #[test]
    fn test_invalid_date_text() {
        assert!(matches!(
            resolve_dates(Some("2022-02-30".into()), None, None),
            Err(MeteosourceError::BadDateTime { .. })
        ));
    }

    #[test]
    fn test_progress_percent_rounds() {
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 8), 13);
    }

    #[test]
    fn test_accumulator_without_success_returns_last_error() {
        let mut accumulator = RangeAccumulator::default();
        accumulator.record_failure(day("2022-03-03"), MeteosourceError::Remote {
            code: 500,
            detail: "first".to_string(),
        });
        accumulator.record_failure(day("2022-03-04"), MeteosourceError::Remote {
            code: 503,
            detail: "second".to_string(),
        });
        let err = accumulator.finish().unwrap_err();
        assert_eq!(err.code(), 503);
        assert_eq!(err.detail(), "second");
    }
}
