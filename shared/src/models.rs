use serde::{Deserialize, Serialize};

use crate::metrics::{self, FriClass};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Centre of the bounding box of `points`, `None` when empty.
    pub fn bbox_centre<'a, I>(points: I) -> Option<LngLat>
    where
        I: IntoIterator<Item = &'a LngLat>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min, mut max) = (*first, *first);
        for p in iter {
            min.lng = min.lng.min(p.lng);
            min.lat = min.lat.min(p.lat);
            max.lng = max.lng.max(p.lng);
            max.lat = max.lat.max(p.lat);
        }
        Some(LngLat {
            lng: (min.lng + max.lng) / 2.0,
            lat: (min.lat + max.lat) / 2.0,
        })
    }
}

/// Weather sample used by the fire weather index.
///
/// Units are the providers' native ones: °C, %, km/h and mm.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub temp: f64,
    pub relative_humidity: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
}

impl WeatherRecord {
    pub fn fwi(&self) -> f64 {
        metrics::fwi(self)
    }

    pub fn details(&self) -> String {
        format!(
            "Temp: {}°C; RH: {}%; Wind: {} km/h; Precip: {} mm",
            self.temp, self.relative_humidity, self.wind_speed, self.precipitation
        )
    }
}

/// The four survey sub-scores, as reported (any of them may be missing).
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyScores {
    pub environment: Option<f64>,
    pub fuel: Option<f64>,
    pub behaviour: Option<f64>,
    pub response: Option<f64>,
}

impl SurveyScores {
    pub fn fsi(&self) -> f64 {
        metrics::fsi(self.environment, self.fuel, self.behaviour, self.response)
    }

    pub fn as_array(&self) -> [Option<f64>; 4] {
        [self.environment, self.fuel, self.behaviour, self.response]
    }
}

pub const DIMENSIONS: [&str; 4] = ["Environment", "Fuel", "Behaviour", "Response"];

/// A surveyed block of a camp. Only blocks whose camp has coordinates exist.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub camp_name: String,
    pub block: String,
    pub scores: SurveyScores,
    pub position: LngLat,
}

impl BlockRecord {
    pub fn fsi(&self) -> f64 {
        self.scores.fsi()
    }
}

/// Current fire weather of a camp and the risk derived from it.
///
/// Built only through [`CurrentRisk::derive`], so `fri_class` always
/// classifies `fri`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRisk {
    fwi: f64,
    fri: f64,
    fri_class: FriClass,
}

impl CurrentRisk {
    pub fn derive(fsi: f64, fwi: f64) -> Self {
        let fri = metrics::fri(fsi, fwi);
        Self {
            fwi,
            fri,
            fri_class: metrics::classify_fri(fri),
        }
    }

    pub fn fwi(&self) -> f64 {
        self.fwi
    }

    pub fn fri(&self) -> f64 {
        self.fri
    }

    pub fn fri_class(&self) -> FriClass {
        self.fri_class
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampSummary {
    pub camp_name: String,
    /// Pre-aggregated camp FSI, not the mean of the camp's blocks.
    pub fsi: f64,
    pub position: LngLat,
    pub dimensions: SurveyScores,
    /// `None` when current weather could not be fetched at startup.
    pub current: Option<CurrentRisk>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bbox_centre() {
        let points = [
            LngLat::new(92.10, 21.20),
            LngLat::new(92.20, 21.10),
            LngLat::new(92.16, 21.18),
        ];
        let centre = LngLat::bbox_centre(&points).unwrap();
        assert_relative_eq!(centre.lng, 92.15, epsilon = 1e-9);
        assert_relative_eq!(centre.lat, 21.15, epsilon = 1e-9);
        assert!(LngLat::bbox_centre(&Vec::<LngLat>::new()).is_none());
    }

    #[test]
    fn test_current_risk_class_follows_fri() {
        let risk = CurrentRisk::derive(60.0, 21.0);
        assert_relative_eq!(risk.fri(), 72.6, epsilon = 1e-9);
        assert_eq!(risk.fri_class(), FriClass::Moderate);

        let risk = CurrentRisk::derive(100.0, 100.0);
        assert_relative_eq!(risk.fri(), 200.0);
        assert_eq!(risk.fri_class(), FriClass::Extreme);
    }

    #[test]
    fn test_weather_details() {
        let w = WeatherRecord {
            temp: 31.2,
            relative_humidity: 64.0,
            wind_speed: 12.5,
            precipitation: 0.0,
        };
        assert_eq!(
            w.details(),
            "Temp: 31.2°C; RH: 64%; Wind: 12.5 km/h; Precip: 0 mm"
        );
    }
}
