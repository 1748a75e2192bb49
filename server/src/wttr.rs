//! wttr.in current conditions, keyed by `"{lat},{lon}"`.
//!
//! Single point in time: the requested date is not sent, whatever the
//! station last observed is returned.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use shared::models::{LngLat, WeatherRecord};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::retry::{with_retry, RetryConfig};
use crate::sources::WeatherSource;

pub const WTTR_URL: &str = "https://wttr.in";

pub struct WttrSource {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

#[derive(Debug, Deserialize)]
pub struct WttrResponse {
    current_condition: Vec<CurrentCondition>,
}

// wttr.in encodes every number as a string.
#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    humidity: String,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: String,
    #[serde(rename = "precipMM")]
    precip_mm: String,
    #[serde(rename = "localObsDateTime", default)]
    local_obs_date_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CurrentConditions {
    pub weather: WeatherRecord,
    pub local_time: Option<String>,
}

impl WttrSource {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn build_url(&self, lat: f64, lon: f64) -> String {
        format!("{}/{},{}", self.base_url, lat, lon)
    }

    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Result<CurrentConditions> {
        let response = with_retry(|| self.request(lat, lon), &self.retry).await?;
        current_from_response(&response)
    }

    async fn request(&self, lat: f64, lon: f64) -> Result<WttrResponse> {
        let response = self
            .client
            .get(self.build_url(lat, lon))
            .query(&[("format", "j1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Status(response.status()));
        }

        Ok(response.json::<WttrResponse>().await?)
    }
}

#[async_trait]
impl WeatherSource for WttrSource {
    async fn noon_weather(&self, point: LngLat, date: NaiveDate) -> Result<WeatherRecord> {
        let current = self.fetch_current(point.lat, point.lng).await?;
        log::debug!(
            "wttr.in observation {:?} used for {}",
            current.local_time,
            date
        );
        Ok(current.weather)
    }
}

pub fn current_from_response(response: &WttrResponse) -> Result<CurrentConditions> {
    let current = response
        .current_condition
        .first()
        .ok_or_else(|| Error::Parse("current_condition is empty".to_string()))?;

    Ok(CurrentConditions {
        weather: WeatherRecord {
            temp: number(&current.temp_c, "temp_C")?,
            relative_humidity: number(&current.humidity, "humidity")?,
            wind_speed: number(&current.windspeed_kmph, "windspeedKmph")?,
            precipitation: number(&current.precip_mm, "precipMM")?,
        },
        local_time: current.local_obs_date_time.clone(),
    })
}

fn number(raw: &str, field: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Parse(format!("{} is not a number: {:?}", field, raw)))
}
