//! Joins survey rows with camp locations.
//!
//! Rows whose camp has no location, or whose location lacks a finite
//! latitude or longitude, are dropped here and never reach the views.

use chrono::NaiveDate;
use shared::models::{BlockRecord, CampSummary, CurrentRisk, LngLat, SurveyScores};
use std::collections::HashMap;

use crate::datasets::{BlockSurveyRow, CampSurveyRow, LocationRow};
use crate::sources::WeatherSource;

/// A camp summary row joined with its location, before weather enrichment.
#[derive(Clone, Debug, PartialEq)]
pub struct CampSite {
    pub camp_name: String,
    pub fsi: f64,
    pub position: LngLat,
    pub dimensions: SurveyScores,
}

/// Camp name to position, first row wins.
pub fn location_index(locations: &[LocationRow]) -> HashMap<&str, Option<LngLat>> {
    let mut index = HashMap::new();
    for row in locations {
        let position = match (row.longitude, row.latitude) {
            (Some(lng), Some(lat)) if lng.is_finite() && lat.is_finite() => {
                Some(LngLat::new(lng, lat))
            }
            _ => None,
        };
        if index.contains_key(row.camp_name.as_str()) {
            log::warn!("Duplicate location for {}, keeping the first", row.camp_name);
            continue;
        }
        index.insert(row.camp_name.as_str(), position);
    }
    index
}

pub fn join_blocks(rows: Vec<BlockSurveyRow>, locations: &[LocationRow]) -> Vec<BlockRecord> {
    let index = location_index(locations);
    let total = rows.len();

    let blocks: Vec<BlockRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let position = index.get(row.camp_name.as_str()).copied().flatten()?;
            Some(BlockRecord {
                scores: SurveyScores {
                    environment: row.environment,
                    fuel: row.fuel,
                    behaviour: row.behaviour,
                    response: row.response,
                },
                camp_name: row.camp_name,
                block: row.block,
                position,
            })
        })
        .collect();

    if blocks.len() < total {
        log::info!(
            "Dropped {} of {} block rows without camp coordinates",
            total - blocks.len(),
            total
        );
    }
    blocks
}

pub fn join_camp_summary(rows: Vec<CampSurveyRow>, locations: &[LocationRow]) -> Vec<CampSite> {
    let index = location_index(locations);
    let total = rows.len();

    let sites: Vec<CampSite> = rows
        .into_iter()
        .filter_map(|row| {
            let position = index.get(row.camp_name.as_str()).copied().flatten()?;
            Some(CampSite {
                fsi: row.fsi,
                dimensions: SurveyScores {
                    environment: row.environment,
                    fuel: row.fuel,
                    behaviour: row.behaviour,
                    response: row.response,
                },
                camp_name: row.camp_name,
                position,
            })
        })
        .collect();

    if sites.len() < total {
        log::info!(
            "Dropped {} of {} camp rows without coordinates",
            total - sites.len(),
            total
        );
    }
    sites
}

/// Fetch today's weather for each camp, one call at a time.
///
/// A failed fetch leaves the camp without current risk rather than
/// aborting startup.
pub async fn enrich_camp_summaries(
    sites: Vec<CampSite>,
    weather: &dyn WeatherSource,
    today: NaiveDate,
) -> Vec<CampSummary> {
    let mut summaries = Vec::with_capacity(sites.len());
    for site in sites {
        let current = match weather.noon_weather(site.position, today).await {
            Ok(record) => Some(CurrentRisk::derive(site.fsi, record.fwi())),
            Err(err) => {
                log::warn!("No current weather for {}: {}", site.camp_name, err);
                None
            }
        };
        summaries.push(CampSummary {
            camp_name: site.camp_name,
            fsi: site.fsi,
            position: site.position,
            dimensions: site.dimensions,
            current,
        });
    }
    summaries
}
