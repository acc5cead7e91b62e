mod config;
mod error;
mod meteosource;
mod options;
mod request;
mod time_machine;
mod transport;
mod types;

pub use config::{ClientConfig, Tier, DEFAULT_BASE_URL, TIERS_AVAILABLE, VERSION};
pub use error::{MeteosourceError, LOCAL_ERROR_CODE};
pub use meteosource::*;
pub use options::{
    Coordinate, DateInput, Dates, PointForecastOptions, ProgressFn, Sections, TimeMachineOptions,
    POINT_FORECAST_OPTIONS, TIME_MACHINE_OPTIONS,
};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};

pub use types::alerts::{Alert, Alerts};
pub use types::forecast::{Current, Forecast};
pub use types::time_machine::{DateFailure, TimeMachine};
pub use types::time_series::{DataPoint, SeriesKind, TimeSeries};
pub use types::traits::any_instant::AnyInstant;
