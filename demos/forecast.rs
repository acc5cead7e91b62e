//! Fetches a forecast and two days of history for Prague.
//!
//! Reads `METEOSOURCE_API_KEY` and optionally `METEOSOURCE_TIER` from the environment.

use meteosource::{
    ClientConfig, Meteosource, MeteosourceError, PointForecastOptions, TimeMachineOptions,
};

#[tokio::main]
async fn main() -> Result<(), MeteosourceError> {
    let config = ClientConfig::from_env()?;
    let client = Meteosource::from_config(&config)?;

    // --- Point forecast ---
    let forecast = client
        .get_point_forecast(
            PointForecastOptions::builder()
                .place_id("prague")
                .sections(["current", "hourly", "daily"])
                .tz("Europe/Prague")
                .units("metric")
                .build(),
        )
        .await?;
    println!("{forecast}");

    if let Some(current) = &forecast.current {
        println!("Now: {:?}", current.get("temperature"));
    }
    if let Some(hourly) = &forecast.hourly {
        println!("{hourly}");
        for point in hourly.iter().take(6) {
            println!("  {} {:?}", point.date(), point.get_f64("temperature"));
        }
    }
    if let Some(daily) = &forecast.daily {
        println!("{daily}");
    }

    // --- Historical data ---
    let history = client
        .get_time_machine(
            TimeMachineOptions::builder()
                .place_id("prague")
                .date_from("2022-03-03")
                .date_to("2022-03-04")
                .tz("Europe/Prague")
                .strict_mode(false)
                .progress(Box::new(|percent| println!("loading... {percent}%")))
                .build(),
        )
        .await?;
    println!("{history}: {}", history.data());
    if !history.failed_dates().is_empty() {
        println!("Failed dates: {:?}", history.failed_dates());
    }

    Ok(())
}
