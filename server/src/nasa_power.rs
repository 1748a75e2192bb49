//! NASA POWER monthly point climatology.
//!
//! Monthly mean (`T2M`) and maximum (`T2M_MAX`) 2 m temperature become a
//! proxy weather record per month with fixed humidity, wind and rain.
//! Any failure is logged and replaced by random placeholder FWI values so
//! the monthly panel always renders.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use shared::models::{LngLat, WeatherRecord};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sources::{Climatology, ClimatologySource, MonthlyWeather};

pub const NASA_POWER_URL: &str = "https://power.larc.nasa.gov/api/temporal/monthly/point";

pub const PROXY_RELATIVE_HUMIDITY: f64 = 50.0;
pub const PROXY_WIND_SPEED: f64 = 10.0;
pub const PROXY_PRECIPITATION: f64 = 2.0;

/// Placeholder FWI values are drawn from `PLACEHOLDER_MIN..PLACEHOLDER_MAX`.
pub const PLACEHOLDER_MIN: u32 = 10;
pub const PLACEHOLDER_MAX: u32 = 35;

/// POWER marks missing aggregates with this value.
const FILL_VALUE: f64 = -999.0;

pub struct PowerSource {
    client: reqwest::Client,
    base_url: String,
    user: Option<String>,
    rng: Mutex<StdRng>,
}

#[derive(Debug, Serialize)]
struct Query<'a> {
    start: i32,
    end: i32,
    latitude: f64,
    longitude: f64,
    community: &'a str,
    parameters: &'a str,
    format: &'a str,
    header: bool,
    #[serde(rename = "time-standard")]
    time_standard: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    parameter: Parameters,
}

#[derive(Debug, Deserialize)]
struct Parameters {
    #[serde(rename = "T2M")]
    t2m: HashMap<String, f64>,
    #[serde(rename = "T2M_MAX")]
    t2m_max: HashMap<String, f64>,
}

impl PowerSource {
    pub fn new(base_url: &str, timeout: Duration, user: Option<String>) -> Result<Self> {
        Self::with_rng(base_url, timeout, user, StdRng::from_os_rng())
    }

    /// Same as [`PowerSource::new`] with a caller-provided placeholder generator.
    pub fn with_rng(
        base_url: &str,
        timeout: Duration,
        user: Option<String>,
        rng: StdRng,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            user,
            rng: Mutex::new(rng),
        })
    }

    /// Twelve months of proxy weather for `year`; never fails.
    pub async fn fetch_monthly_climatology(&self, lat: f64, lon: f64, year: i32) -> Climatology {
        let fetched = self.request(lat, lon, year).await;
        self.resolve(year, fetched.and_then(|body| parse_response(&body)))
    }

    /// Turn a fetch outcome into a climatology, substituting placeholders on error.
    pub fn resolve(&self, year: i32, fetched: Result<Vec<WeatherRecord>>) -> Climatology {
        match fetched {
            Ok(records) => Climatology {
                year,
                months: records.into_iter().map(MonthlyWeather::Proxy).collect(),
            },
            Err(err) => {
                log::error!("Error fetching monthly climatology from NASA POWER: {}", err);
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                Climatology {
                    year,
                    months: placeholder_months(&mut *rng),
                }
            }
        }
    }

    async fn request(&self, lat: f64, lon: f64, year: i32) -> Result<String> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&Query {
                start: year,
                end: year,
                latitude: lat,
                longitude: lon,
                community: "sb",
                parameters: "T2M,T2M_MAX",
                format: "json",
                header: true,
                time_standard: "utc",
                user: self.user.as_deref(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Status(response.status()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ClimatologySource for PowerSource {
    async fn monthly_climatology(&self, point: LngLat, year: i32) -> Climatology {
        self.fetch_monthly_climatology(point.lat, point.lng, year)
            .await
    }
}

/// Proxy weather for months `01`..`12` of a POWER monthly response.
pub fn parse_response(body: &str) -> Result<Vec<WeatherRecord>> {
    let response: PowerResponse = serde_json::from_str(body)?;
    let params = response.properties.parameter;

    (1..=12)
        .map(|month| {
            let key = format!("{:02}", month);
            let mean = aggregate(&params.t2m, &key, "T2M")?;
            let max = aggregate(&params.t2m_max, &key, "T2M_MAX")?;
            Ok(proxy_weather((mean + max) / 2.0))
        })
        .collect()
}

fn aggregate(values: &HashMap<String, f64>, month: &str, parameter: &str) -> Result<f64> {
    match values.get(month) {
        Some(v) if *v != FILL_VALUE => Ok(*v),
        Some(_) => Err(Error::Parse(format!("{} is missing for month {}", parameter, month))),
        None => Err(Error::Parse(format!("{} has no month {}", parameter, month))),
    }
}

pub fn proxy_weather(avg_temp: f64) -> WeatherRecord {
    WeatherRecord {
        temp: avg_temp,
        relative_humidity: PROXY_RELATIVE_HUMIDITY,
        wind_speed: PROXY_WIND_SPEED,
        precipitation: PROXY_PRECIPITATION,
    }
}

/// Twelve whole-number FWI placeholders in `[10, 35)`.
pub fn placeholder_months<R: Rng + ?Sized>(rng: &mut R) -> Vec<MonthlyWeather> {
    (0..12)
        .map(|_| {
            MonthlyWeather::Placeholder(rng.random_range(PLACEHOLDER_MIN..PLACEHOLDER_MAX) as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn source(seed: u64) -> PowerSource {
        PowerSource::with_rng(
            "http://127.0.0.1:1/api/temporal/monthly/point",
            Duration::from_secs(2),
            None,
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    fn response_body(t2m: &[f64; 12], t2m_max: &[f64; 12]) -> String {
        let months = |values: &[f64; 12]| {
            let mut map = serde_json::Map::new();
            for (i, v) in values.iter().enumerate() {
                map.insert(format!("{:02}", i + 1), serde_json::json!(v));
            }
            // annual aggregate, ignored
            map.insert("13".to_string(), serde_json::json!(0.0));
            serde_json::Value::Object(map)
        };
        serde_json::json!({
            "type": "Feature",
            "properties": {"parameter": {"T2M": months(t2m), "T2M_MAX": months(t2m_max)}}
        })
        .to_string()
    }

    fn assert_placeholders(climatology: &Climatology) {
        assert_eq!(climatology.months.len(), 12);
        for month in &climatology.months {
            match month {
                MonthlyWeather::Placeholder(v) => {
                    assert!((10.0..35.0).contains(v), "{} out of range", v);
                    assert_eq!(v.fract(), 0.0);
                }
                other => panic!("expected placeholder, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_response() {
        let t2m = [20.0, 22.0, 25.0, 27.0, 28.0, 28.0, 27.5, 27.5, 27.0, 26.0, 23.0, 20.0];
        let t2m_max = [26.0, 28.0, 32.0, 33.0, 32.0, 30.0, 29.5, 29.5, 30.0, 31.0, 29.0, 26.0];
        let records = parse_response(&response_body(&t2m, &t2m_max)).unwrap();
        assert_eq!(records.len(), 12);
        assert_relative_eq!(records[0].temp, 23.0);
        assert_relative_eq!(records[3].temp, 30.0);
        assert_eq!(records[3].relative_humidity, 50.0);
        assert_eq!(records[3].wind_speed, 10.0);
        assert_eq!(records[3].precipitation, 2.0);
        // 15 + 5 + 3 - 0.4
        assert_relative_eq!(records[3].fwi(), 22.6, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_month_is_an_error() {
        let body = r#"{"properties": {"parameter": {"T2M": {"01": 20.0}, "T2M_MAX": {"01": 25.0}}}}"#;
        assert!(matches!(parse_response(body), Err(Error::Parse(_))));
    }

    #[test]
    fn test_fill_value_is_an_error() {
        let mut t2m = [25.0; 12];
        t2m[6] = -999.0;
        assert!(parse_response(&response_body(&t2m, &[30.0; 12])).is_err());
    }

    #[test]
    fn test_unparsable_response_falls_back_to_placeholders() {
        let source = source(7);
        let climatology = source.resolve(2025, parse_response("<html>Service Unavailable</html>"));
        assert_eq!(climatology.year, 2025);
        assert!(climatology.is_placeholder());
        assert_placeholders(&climatology);
    }

    #[test]
    fn test_seeded_placeholders_are_reproducible() {
        let a = source(42).resolve(2025, Err(Error::Parse("boom".into())));
        let b = source(42).resolve(2025, Err(Error::Parse("boom".into())));
        assert_eq!(a, b);
    }

    #[test]
    fn test_observed_climatology() {
        let records = vec![proxy_weather(30.0); 12];
        let climatology = source(1).resolve(2024, Ok(records));
        assert!(!climatology.is_placeholder());
        assert_relative_eq!(climatology.months[11].fwi(), 22.6, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_unreachable_provider_never_errors() {
        let climatology = source(3).fetch_monthly_climatology(21.2, 92.15, 2025).await;
        assert_placeholders(&climatology);
    }
}
