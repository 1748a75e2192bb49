use chrono::NaiveDate;
use shared::models::{BlockRecord, CampSummary};
use std::collections::{BTreeMap, HashSet};

use crate::boundaries::Boundaries;
use crate::config::Config;
use crate::datasets::{self, Contacts};
use crate::error::Result;
use crate::joins::{self, CampSite};
use crate::sources::WeatherSource;

/// Everything read from disk, joined, before any network call.
#[derive(Clone, Debug)]
pub struct SurveyData {
    pub blocks: Vec<BlockRecord>,
    pub sites: Vec<CampSite>,
    pub boundaries: Boundaries,
    pub contacts: Contacts,
}

impl SurveyData {
    pub fn load(config: &Config) -> Result<Self> {
        let locations = datasets::load_locations(&config.camp_locations)?;
        let block_rows = datasets::load_block_survey(&config.block_survey)?;
        let camp_rows = datasets::load_camp_survey(&config.camp_survey)?;
        let contacts = match &config.contacts {
            Some(path) => datasets::load_contacts(path)?,
            None => Contacts::new(),
        };

        Ok(SurveyData {
            blocks: joins::join_blocks(block_rows, &locations),
            sites: joins::join_camp_summary(camp_rows, &locations),
            boundaries: Boundaries::load(&config.boundaries)?,
            contacts,
        })
    }
}

/// Immutable application state, built once at startup.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub camps: Vec<CampSummary>,
    pub blocks: Vec<BlockRecord>,
    pub boundaries: Boundaries,
    pub contacts: Contacts,
}

impl AppState {
    pub async fn load(config: &Config, weather: &dyn WeatherSource, today: NaiveDate) -> Result<Self> {
        let data = SurveyData::load(config)?;
        Ok(Self::build(data, weather, today).await)
    }

    pub async fn build(data: SurveyData, weather: &dyn WeatherSource, today: NaiveDate) -> Self {
        log::info!(
            "Fetching current weather for {} camps ({} blocks)",
            data.sites.len(),
            data.blocks.len()
        );
        let camps = joins::enrich_camp_summaries(data.sites, weather, today).await;
        AppState {
            camps,
            blocks: data.blocks,
            boundaries: data.boundaries,
            contacts: data.contacts,
        }
    }

    pub fn camp(&self, name: &str) -> Option<&CampSummary> {
        self.camps.iter().find(|c| c.camp_name == name)
    }

    pub fn blocks_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a BlockRecord> + 'a {
        self.blocks.iter().filter(move |b| b.camp_name == name)
    }

    /// Selectable camps: those with at least one located block, in file order.
    pub fn camp_names(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut names = Vec::new();
        for block in &self.blocks {
            if seen.insert(block.camp_name.as_str()) {
                names.push(block.camp_name.clone());
            }
        }
        names
    }

    pub fn contacts_for(&self, name: &str) -> BTreeMap<String, String> {
        self.contacts.get(name).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::{weather, StubWeather};
    use std::fs;

    fn write_config(dir: &std::path::Path, blocks_header: &str) -> Config {
        fs::write(
            dir.join("aor.csv"),
            "New_Camp_Name,Latitude,Longitude\nCamp 1E,21.21,92.15\nCamp 2W,21.18,92.14\nCamp 9,,\n",
        )
        .unwrap();
        fs::write(
            dir.join("blocks.csv"),
            format!(
                "{}\nCamp 2W,B1,50,50,50,50\nCamp 1E,A1,80,60,,40\nCamp 2W,B2,40,40,40,40\nCamp 9,Z1,90,90,90,90\n",
                blocks_header
            ),
        )
        .unwrap();
        fs::write(
            dir.join("camps.csv"),
            "CampName,FSI\nCamp 1E,60\nCamp 2W,45\nCamp 9,90\n",
        )
        .unwrap();
        fs::write(dir.join("contacts.csv"), "CampName,Focal Point\nCamp 1E,CiC office\n").unwrap();

        Config {
            camp_locations: dir.join("aor.csv"),
            block_survey: dir.join("blocks.csv"),
            camp_survey: dir.join("camps.csv"),
            boundaries: dir.join("missing.json"),
            contacts: Some(dir.join("contacts.csv")),
            ..Config::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 12).unwrap()
    }

    #[tokio::test]
    async fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "CampName,Block,Environment,Fuel,Behaviour,Response");
        let stub = StubWeather::constant(weather(30.0, 40.0, 10.0, 5.0));

        let state = AppState::load(&config, &stub, today()).await.unwrap();
        assert_eq!(state.camp_names(), vec!["Camp 2W", "Camp 1E"]);
        assert_eq!(state.camps.len(), 2);
        assert!(state.camp("Camp 9").is_none());
        assert_eq!(state.blocks_for("Camp 2W").count(), 2);
        assert!(state.boundaries.is_empty());
        assert_eq!(
            state.contacts_for("Camp 1E").get("Focal Point").map(String::as_str),
            Some("CiC office")
        );
        assert!(state.contacts_for("Camp 2W").is_empty());
    }

    #[tokio::test]
    async fn test_missing_block_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "CampName,Section,Environment,Fuel,Behaviour,Response");
        let result = AppState::load(&config, &StubWeather::unavailable(), today()).await;
        assert!(matches!(
            result,
            Err(crate::error::Error::MissingColumn { column: "Block", .. })
        ));
    }
}
