//! Open-Meteo forecast source for the 13:00 weather sample.
//!
//! One request per (location, day), hourly variables plus the daily
//! precipitation total, in the location's own timezone.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::models::{LngLat, WeatherRecord};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::retry::{with_retry, RetryConfig};
use crate::sources::WeatherSource;

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

const HOURLY_FIELDS: &str = "temperature_2m,relativehumidity_2m,windspeed_10m,precipitation";
const DAILY_FIELDS: &str = "precipitation_sum";
const NOON_SAMPLE: &str = "T13:00";

pub struct OpenMeteoSource {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
struct Query<'a> {
    latitude: f64,
    longitude: f64,
    start_date: String,
    end_date: String,
    hourly: &'a str,
    daily: &'a str,
    timezone: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    hourly: Hourly,
    #[serde(default)]
    daily: Option<Daily>,
}

#[derive(Debug, Deserialize)]
struct Hourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    #[serde(alias = "relative_humidity_2m")]
    relativehumidity_2m: Vec<Option<f64>>,
    #[serde(alias = "wind_speed_10m")]
    windspeed_10m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct Daily {
    precipitation_sum: Vec<Option<f64>>,
}

impl OpenMeteoSource {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            retry,
        })
    }

    /// Weather at 13:00 local time, or the daily fallback when that hour
    /// is missing. Request and parse failures are returned to the caller.
    pub async fn fetch_noon_weather(
        &self,
        lat: f64,
        lon: f64,
        date: NaiveDate,
    ) -> Result<WeatherRecord> {
        let response = with_retry(|| self.request(lat, lon, date), &self.retry).await?;
        noon_weather_from_response(date, &response)
    }

    async fn request(&self, lat: f64, lon: f64, date: NaiveDate) -> Result<ForecastResponse> {
        let day = date.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&Query {
                latitude: lat,
                longitude: lon,
                start_date: day.clone(),
                end_date: day,
                hourly: HOURLY_FIELDS,
                daily: DAILY_FIELDS,
                timezone: "auto",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Status(response.status()));
        }

        Ok(response.json::<ForecastResponse>().await?)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    async fn noon_weather(&self, point: LngLat, date: NaiveDate) -> Result<WeatherRecord> {
        self.fetch_noon_weather(point.lat, point.lng, date).await
    }
}

/// Pick the 13:00 sample for `date`.
///
/// Without it: hottest hour, mean humidity, mean wind, and the daily
/// precipitation total (not an hourly value).
pub fn noon_weather_from_response(
    date: NaiveDate,
    response: &ForecastResponse,
) -> Result<WeatherRecord> {
    let hourly = &response.hourly;
    let noon = format!("{}{}", date.format("%Y-%m-%d"), NOON_SAMPLE);

    if let Some(idx) = hourly.time.iter().position(|t| *t == noon) {
        return Ok(WeatherRecord {
            temp: sample(&hourly.temperature_2m, idx, "temperature_2m")?,
            relative_humidity: sample(&hourly.relativehumidity_2m, idx, "relativehumidity_2m")?,
            wind_speed: sample(&hourly.windspeed_10m, idx, "windspeed_10m")?,
            precipitation: sample(&hourly.precipitation, idx, "precipitation")?,
        });
    }

    log::debug!(
        "No {} sample in {} hourly values, using daily aggregates",
        noon,
        hourly.time.len()
    );

    let precipitation = response
        .daily
        .as_ref()
        .and_then(|daily| daily.precipitation_sum.first().copied().flatten())
        .ok_or_else(|| Error::Parse("daily.precipitation_sum is empty".to_string()))?;

    Ok(WeatherRecord {
        temp: present(&hourly.temperature_2m, "temperature_2m")?
            .fold(f64::NEG_INFINITY, f64::max),
        relative_humidity: mean(&hourly.relativehumidity_2m, "relativehumidity_2m")?,
        wind_speed: mean(&hourly.windspeed_10m, "windspeed_10m")?,
        precipitation,
    })
}

fn sample(values: &[Option<f64>], idx: usize, field: &str) -> Result<f64> {
    values
        .get(idx)
        .copied()
        .flatten()
        .ok_or_else(|| Error::Parse(format!("hourly.{} has no value at 13:00", field)))
}

/// Non-null values of an hourly series; an all-null series is an error.
fn present<'a>(
    values: &'a [Option<f64>],
    field: &str,
) -> Result<impl Iterator<Item = f64> + 'a> {
    if values.iter().all(Option::is_none) {
        return Err(Error::Parse(format!("hourly.{} is empty", field)));
    }
    Ok(values.iter().filter_map(|v| *v))
}

fn mean(values: &[Option<f64>], field: &str) -> Result<f64> {
    let (sum, count) = present(values, field)?.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    Ok(sum / count as f64)
}
