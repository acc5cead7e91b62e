//! The client entry point: construction and the two query operations.

use crate::config::ClientConfig;
use crate::options::{PointForecastOptions, TimeMachineOptions};
use crate::request::ApiRequester;
use crate::time_machine::{load_range, resolve_dates, RangeQuery};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::forecast::Forecast;
use crate::types::time_machine::TimeMachine;
use crate::types::traits::any_instant::parse_timezone;
use crate::{MeteosourceError, Tier};
use bon::bon;
use log::info;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const POINT_ENDPOINT: &str = "/point";

/// Client for the Meteosource weather API.
///
/// A client is validated once at construction and is immutable afterwards. It
/// can be cloned cheaply and shared between tasks.
///
/// # Examples
///
/// ```rust
/// # use meteosource::{Meteosource, MeteosourceError, PointForecastOptions};
/// # async fn run() -> Result<(), MeteosourceError> {
/// let client = Meteosource::builder()
///     .api_key("your-api-key")
///     .tier("flexi")
///     .build()?;
///
/// let forecast = client
///     .get_point_forecast(
///         PointForecastOptions::builder()
///             .place_id("london")
///             .sections(["current", "hourly"])
///             .tz("Europe/London")
///             .build(),
///     )
///     .await?;
/// if let Some(hourly) = &forecast.hourly {
///     println!("{hourly}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Meteosource {
    requester: ApiRequester,
}

#[bon]
impl Meteosource {
    /// Creates a client, validating every argument before any request is made.
    ///
    /// # Arguments
    ///
    /// * `.api_key(..)`: **Required.** The Meteosource API key.
    /// * `.tier(..)`: **Required.** One of [`crate::TIERS_AVAILABLE`].
    /// * `.base_url(..)`: Optional. Defaults to [`crate::DEFAULT_BASE_URL`].
    /// * `.timeout_secs(..)`: Optional request timeout. Defaults to `30`.
    /// * `.transport(..)`: Optional custom [`Transport`]; a `reqwest` client is used otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`MeteosourceError::Config`] for an empty key, an unknown tier,
    /// a base URL that is not absolute, or a zero timeout.
    #[builder]
    pub fn new(
        #[builder(into)] api_key: String,
        #[builder(into)] tier: String,
        #[builder(into)] base_url: Option<String>,
        timeout_secs: Option<u64>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self, MeteosourceError> {
        let mut config = ClientConfig::new(api_key, tier);
        if let Some(base_url) = base_url {
            config.base_url = base_url;
        }
        if let Some(timeout_secs) = timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        Self::connect(&config, transport)
    }

    /// Creates a client from a [`ClientConfig`], e.g. one read with
    /// [`ClientConfig::from_env`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, MeteosourceError> {
        Self::connect(config, None)
    }

    /// Like [`Meteosource::from_config`], sending requests through `transport`.
    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, MeteosourceError> {
        Self::connect(config, Some(transport))
    }

    fn connect(
        config: &ClientConfig,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self, MeteosourceError> {
        let (tier, base_url) = config.validate()?;
        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(Duration::from_secs(
                config.timeout_secs,
            ))?),
        };
        info!("Meteosource client ready: tier {}, base URL {}", tier, base_url);
        Ok(Self {
            requester: ApiRequester::new(config.api_key.clone(), tier, base_url, transport),
        })
    }

    pub fn tier(&self) -> Tier {
        self.requester.tier()
    }

    pub fn base_url(&self) -> &str {
        self.requester.base_url()
    }

    /// Fetches a forecast for one location with a single `/point` request.
    ///
    /// The API is always queried in UTC; returned dates are then converted to
    /// `options.tz` (UTC when unset).
    ///
    /// # Errors
    ///
    /// * [`MeteosourceError::BadTimezone`] for an unknown `tz`, before any request.
    /// * [`MeteosourceError::Remote`] when the API rejects the request.
    /// * [`MeteosourceError::Transport`] when no response was received.
    /// * [`MeteosourceError::MalformedResponse`] or [`MeteosourceError::BadDateTime`]
    ///   when the body cannot be enriched.
    pub async fn get_point_forecast(
        &self,
        options: PointForecastOptions,
    ) -> Result<Forecast, MeteosourceError> {
        let tz = parse_timezone(options.tz.as_deref())?;
        let params = [
            ("lat", options.lat.map(|lat| lat.to_string())),
            ("lon", options.lon.map(|lon| lon.to_string())),
            ("place_id", options.place_id),
            ("sections", options.sections.map(|sections| sections.to_string())),
            ("timezone", Some("utc".to_string())),
            ("language", options.lang),
            ("units", options.units),
        ];
        let body = self.requester.compose_request(POINT_ENDPOINT, &params).await?;
        Forecast::enrich(body, tz)
    }

    /// Fetches historical hourly data, one `/time_machine` request per date.
    ///
    /// Dates are requested strictly in order. With `strict_mode` unset or
    /// `true` the first failing date aborts the call; with `false` failing
    /// dates are skipped and listed in [`TimeMachine::failed_dates`], and the
    /// call only fails when every date failed (with the last error seen).
    ///
    /// # Errors
    ///
    /// [`MeteosourceError::InvalidOptions`] (without any request) when neither or
    /// both of `date` and `date_from` + `date_to` are given, when
    /// `date_from > date_to`, or when `date` is an empty list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use meteosource::{Meteosource, MeteosourceError, TimeMachineOptions};
    /// # async fn run(client: Meteosource) -> Result<(), MeteosourceError> {
    /// let history = client
    ///     .get_time_machine(
    ///         TimeMachineOptions::builder()
    ///             .place_id("prague")
    ///             .date_from("2022-03-01")
    ///             .date_to("2022-03-07")
    ///             .tz("Europe/Prague")
    ///             .strict_mode(false)
    ///             .build(),
    ///     )
    ///     .await?;
    /// println!("{} hours, failed: {:?}", history.data().len(), history.failed_dates());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_time_machine(
        &self,
        options: TimeMachineOptions,
    ) -> Result<TimeMachine, MeteosourceError> {
        let TimeMachineOptions {
            date,
            date_from,
            date_to,
            lat,
            lon,
            place_id,
            tz,
            units,
            progress,
            strict_mode,
        } = options;

        let tz = parse_timezone(tz.as_deref())?;
        let dates = resolve_dates(date, date_from, date_to)?;
        let query = RangeQuery {
            lat: lat.map(|lat| lat.to_string()),
            lon: lon.map(|lon| lon.to_string()),
            place_id,
            units,
        };
        let strict = strict_mode.unwrap_or(true);

        let (merged, failures) = load_range(&self.requester, &query, dates, strict, progress).await?;
        TimeMachine::enrich(merged, tz, failures)
    }
}

impl fmt::Debug for Meteosource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meteosource")
            .field("tier", &self.tier())
            .field("base_url", &self.base_url())
            .finish_non_exhaustive()
    }
}
