//! Static survey and location tables, read once at startup.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

pub const CAMP_NAME: &str = "CampName";
pub const BLOCK: &str = "Block";

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LocationRow {
    #[serde(rename = "CampName", alias = "New_Camp_Name")]
    pub camp_name: String,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BlockSurveyRow {
    #[serde(rename = "CampName")]
    pub camp_name: String,
    #[serde(rename = "Block")]
    pub block: String,
    #[serde(rename = "Environment", default)]
    pub environment: Option<f64>,
    #[serde(rename = "Fuel", default)]
    pub fuel: Option<f64>,
    #[serde(rename = "Behaviour", default)]
    pub behaviour: Option<f64>,
    #[serde(rename = "Response", default)]
    pub response: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CampSurveyRow {
    #[serde(rename = "CampName")]
    pub camp_name: String,
    #[serde(rename = "FSI")]
    pub fsi: f64,
    #[serde(rename = "Environment", default)]
    pub environment: Option<f64>,
    #[serde(rename = "Fuel", default)]
    pub fuel: Option<f64>,
    #[serde(rename = "Behaviour", default)]
    pub behaviour: Option<f64>,
    #[serde(rename = "Response", default)]
    pub response: Option<f64>,
}

/// Free-text contact fields per camp, empty cells dropped.
pub type Contacts = HashMap<String, BTreeMap<String, String>>;

pub fn load_locations(path: &Path) -> Result<Vec<LocationRow>> {
    read_locations(open(path)?, &path.display().to_string())
}

pub fn load_block_survey(path: &Path) -> Result<Vec<BlockSurveyRow>> {
    read_block_survey(open(path)?, &path.display().to_string())
}

pub fn load_camp_survey(path: &Path) -> Result<Vec<CampSurveyRow>> {
    read_camp_survey(open(path)?, &path.display().to_string())
}

pub fn load_contacts(path: &Path) -> Result<Contacts> {
    read_contacts(open(path)?, &path.display().to_string())
}

pub fn read_locations<R: Read>(reader: R, dataset: &str) -> Result<Vec<LocationRow>> {
    read_rows(reader, dataset, &["Latitude", "Longitude"])
}

/// Block rows; a file without the `Block` column is a configuration error.
pub fn read_block_survey<R: Read>(reader: R, dataset: &str) -> Result<Vec<BlockSurveyRow>> {
    read_rows(reader, dataset, &[CAMP_NAME, BLOCK])
}

pub fn read_camp_survey<R: Read>(reader: R, dataset: &str) -> Result<Vec<CampSurveyRow>> {
    read_rows(reader, dataset, &[CAMP_NAME, "FSI"])
}

pub fn read_contacts<R: Read>(reader: R, dataset: &str) -> Result<Contacts> {
    let rows: Vec<HashMap<String, String>> = read_rows(reader, dataset, &[CAMP_NAME])?;
    let mut contacts = Contacts::new();
    for mut row in rows {
        let camp = match row.remove(CAMP_NAME) {
            Some(camp) if !camp.is_empty() => camp,
            _ => continue,
        };
        let fields = contacts.entry(camp).or_default();
        fields.extend(row.into_iter().filter(|(_, v)| !v.is_empty()));
    }
    Ok(contacts)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_rows<R: Read, T: DeserializeOwned>(
    reader: R,
    dataset: &str,
    required: &[&'static str],
) -> Result<Vec<T>> {
    let csv_error = |source| Error::Csv {
        dataset: dataset.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::MissingColumn {
                dataset: dataset.to_string(),
                column,
            });
        }
    }

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(csv_error)?;
    log::debug!("Loaded {} rows from {}", rows.len(), dataset);
    Ok(rows)
}
