use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::nasa_power::NASA_POWER_URL;
use crate::open_meteo::OPEN_METEO_URL;
use crate::wttr::WTTR_URL;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherProvider {
    OpenMeteo,
    Wttr,
}

/// Read from `FIRERISK_*` environment variables, e.g. `FIRERISK_BLOCK_SURVEY`.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_camp_locations")]
    pub camp_locations: PathBuf,
    #[serde(default = "default_block_survey")]
    pub block_survey: PathBuf,
    #[serde(default = "default_camp_survey")]
    pub camp_survey: PathBuf,
    #[serde(default = "default_boundaries")]
    pub boundaries: PathBuf,
    #[serde(default)]
    pub contacts: Option<PathBuf>,

    #[serde(default = "default_weather_provider")]
    pub weather_provider: WeatherProvider,
    #[serde(default = "default_open_meteo_url")]
    pub open_meteo_url: String,
    #[serde(default = "default_wttr_url")]
    pub wttr_url: String,
    #[serde(default = "default_nasa_power_url")]
    pub nasa_power_url: String,
    /// Optional `user` tag sent to NASA POWER.
    #[serde(default)]
    pub power_user: Option<String>,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Extra attempts for failed weather requests; 0 fails fast.
    #[serde(default)]
    pub fetch_retries: u32,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

fn default_camp_locations() -> PathBuf {
    PathBuf::from("data/camp_locations.csv")
}

fn default_block_survey() -> PathBuf {
    PathBuf::from("data/fire_susceptibility_blocks.csv")
}

fn default_camp_survey() -> PathBuf {
    PathBuf::from("data/fire_susceptibility_camps.csv")
}

fn default_boundaries() -> PathBuf {
    PathBuf::from("data/camp_outline.json")
}

fn default_weather_provider() -> WeatherProvider {
    WeatherProvider::OpenMeteo
}

fn default_open_meteo_url() -> String {
    OPEN_METEO_URL.to_string()
}

fn default_wttr_url() -> String {
    WTTR_URL.to_string()
}

fn default_nasa_power_url() -> String {
    NASA_POWER_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_forecast_days() -> u32 {
    14
}

impl Config {
    pub fn from_env() -> Result<Config, envy::Error> {
        envy::prefixed("FIRERISK_").from_env::<Config>()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            camp_locations: default_camp_locations(),
            block_survey: default_block_survey(),
            camp_survey: default_camp_survey(),
            boundaries: default_boundaries(),
            contacts: None,
            weather_provider: default_weather_provider(),
            open_meteo_url: default_open_meteo_url(),
            wttr_url: default_wttr_url(),
            nasa_power_url: default_nasa_power_url(),
            power_user: None,
            http_timeout_secs: default_http_timeout_secs(),
            fetch_retries: 0,
            forecast_days: default_forecast_days(),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    Config::from_env().expect("Invalid FIRERISK_* configuration in environment")
});

pub fn config() -> &'static Config {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_env() {
        let config: Config = envy::prefixed("FIRERISK_")
            .from_iter(Vec::<(String, String)>::new())
            .unwrap();
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.forecast_days, 14);
        assert_eq!(config.fetch_retries, 0);
        assert_eq!(config.weather_provider, WeatherProvider::OpenMeteo);
        assert!(config.contacts.is_none());
    }

    #[test]
    fn test_overrides() {
        let config: Config = envy::prefixed("FIRERISK_")
            .from_iter(vec![
                ("FIRERISK_WEATHER_PROVIDER".to_string(), "wttr".to_string()),
                ("FIRERISK_FORECAST_DAYS".to_string(), "7".to_string()),
                (
                    "FIRERISK_CONTACTS".to_string(),
                    "data/contacts.csv".to_string(),
                ),
            ])
            .unwrap();
        assert_eq!(config.weather_provider, WeatherProvider::Wttr);
        assert_eq!(config.forecast_days, 7);
        assert_eq!(config.contacts, Some(PathBuf::from("data/contacts.csv")));
    }
}
