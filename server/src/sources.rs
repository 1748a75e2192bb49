//! Provider-agnostic weather seams used by the dashboard.

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{LngLat, WeatherRecord};
use std::sync::Arc;

use crate::config::{Config, WeatherProvider};
use crate::error::Result;
use crate::nasa_power::PowerSource;
use crate::open_meteo::OpenMeteoSource;
use crate::retry::RetryConfig;
use crate::wttr::WttrSource;

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Weather at 13:00 local time on `date`.
    async fn noon_weather(&self, point: LngLat, date: NaiveDate) -> Result<WeatherRecord>;
}

/// One month of the climatology series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MonthlyWeather {
    /// Weather derived from the monthly aggregates.
    Proxy(WeatherRecord),
    /// FWI stand-in used when the provider failed.
    Placeholder(f64),
}

impl MonthlyWeather {
    pub fn fwi(&self) -> f64 {
        match self {
            MonthlyWeather::Proxy(weather) => weather.fwi(),
            MonthlyWeather::Placeholder(fwi) => *fwi,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Climatology {
    pub year: i32,
    /// Always twelve entries, January first.
    pub months: Vec<MonthlyWeather>,
}

impl Climatology {
    pub fn is_placeholder(&self) -> bool {
        self.months
            .iter()
            .any(|m| matches!(m, MonthlyWeather::Placeholder(_)))
    }
}

/// Never fails: providers degrade to placeholder months instead.
#[async_trait]
pub trait ClimatologySource: Send + Sync {
    async fn monthly_climatology(&self, point: LngLat, year: i32) -> Climatology;
}

pub fn weather_source(config: &Config) -> Result<Arc<dyn WeatherSource>> {
    let retry = RetryConfig::new(config.fetch_retries);
    let source: Arc<dyn WeatherSource> = match config.weather_provider {
        WeatherProvider::OpenMeteo => Arc::new(OpenMeteoSource::new(
            &config.open_meteo_url,
            config.http_timeout(),
            retry,
        )?),
        WeatherProvider::Wttr => Arc::new(WttrSource::new(
            &config.wttr_url,
            config.http_timeout(),
            retry,
        )?),
    };
    Ok(source)
}

pub fn climatology_source(config: &Config) -> Result<Arc<dyn ClimatologySource>> {
    Ok(Arc::new(PowerSource::new(
        &config.nasa_power_url,
        config.http_timeout(),
        config.power_user.clone(),
    )?))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        let proxy = MonthlyWeather::Proxy(testing::weather(30.0, 50.0, 10.0, 2.0));
        let observed = Climatology {
            year: 2025,
            months: vec![proxy; 12],
        };
        assert!(!observed.is_placeholder());

        let mut months = vec![proxy; 11];
        months.push(MonthlyWeather::Placeholder(17.0));
        let degraded = Climatology {
            year: 2025,
            months,
        };
        assert!(degraded.is_placeholder());
    }

    #[test]
    fn test_monthly_fwi() {
        let proxy = MonthlyWeather::Proxy(testing::weather(30.0, 50.0, 10.0, 2.0));
        // 15 + 5 + 3 - 0.4
        assert!((proxy.fwi() - 22.6).abs() < 1e-9);
        assert_eq!(MonthlyWeather::Placeholder(12.0).fwi(), 12.0);
    }
}
