pub(crate) mod alerts;
pub(crate) mod forecast;
pub(crate) mod time_machine;
pub(crate) mod time_series;
pub(crate) mod traits;
