use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::metrics::{FriClass, FsiClass};
use super::models::LngLat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Monthly,
    Current,
    Forecasted,
}

impl FromStr for TimeWindow {
    type Err = ();
    fn from_str(s: &str) -> Result<TimeWindow, ()> {
        match s {
            "monthly" => Ok(TimeWindow::Monthly),
            "current" => Ok(TimeWindow::Current),
            "forecasted" => Ok(TimeWindow::Forecasted),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeWindow::Monthly => "monthly",
            TimeWindow::Current => "current",
            TimeWindow::Forecasted => "forecasted",
        })
    }
}

/// Returned in place of a view when the camp is unknown to a dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoData {
    pub camp: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CampList {
    pub camps: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewRow {
    pub camp: String,
    pub fsi: i64,
    pub fwi: Option<i64>,
    pub fri: Option<i64>,
    pub fri_class: Option<FriClass>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Overview {
    pub rows: Vec<OverviewRow>,
    pub centre: Option<LngLat>,
}

/// Camp-level sub-scores, ceiled for the dimensions panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DimensionScores {
    pub environment: i64,
    pub fuel: i64,
    pub behaviour: i64,
    pub response: i64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FsiCard {
    pub value: i64,
    pub class: FsiClass,
    pub dimensions: DimensionScores,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FwiCard {
    pub value: Option<i64>,
    pub short_class: Option<&'static str>,
    /// Today's weather at the camp; `None` when the provider was unreachable.
    pub weather: Option<String>,
    pub last_update: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriCard {
    pub value: Option<i64>,
    pub short_class: Option<&'static str>,
    pub formula: Option<String>,
    pub severity: Option<FriClass>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRow {
    pub block: String,
    pub fsi: i64,
    pub fsi_class: FsiClass,
}

/// Mean sub-scores of one block, for the grouped bar chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockDimensions {
    pub block: String,
    pub scores: BTreeMap<&'static str, Option<i64>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteView {
    pub camp: String,
    pub contacts: BTreeMap<String, String>,
    pub fsi: FsiCard,
    pub fwi: FwiCard,
    pub fri: FriCard,
    pub blocks: Vec<BlockRow>,
    pub block_dimensions: Vec<BlockDimensions>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Narrative {
    pub heading: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    pub month: &'static str,
    pub fwi: f64,
    pub fri: i64,
    pub risk: FriClass,
    pub color: &'static str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPanel {
    pub year: i32,
    pub title: String,
    pub months: Vec<MonthlyPoint>,
    /// Set when the climatology provider failed and placeholders are shown.
    pub placeholder: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonBar {
    pub camp: String,
    pub fri: i64,
    pub fri_class: FriClass,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPanel {
    pub title: String,
    pub bars: Vec<ComparisonBar>,
    pub rank: Option<usize>,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: String,
    pub fri: Option<i64>,
    pub risk: Option<FriClass>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPanel {
    pub title: String,
    pub days: Vec<ForecastDay>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "window", rename_all = "lowercase")]
pub enum Panel {
    Monthly(MonthlyPanel),
    Current(CurrentPanel),
    Forecasted(ForecastPanel),
}

#[derive(Clone, Debug, Serialize)]
pub struct WindowView {
    pub panel: Panel,
    pub narrative: Narrative,
}
