//! View assembly: selects records from the application state, fetches the
//! weather a view needs and turns metrics into display values.
//!
//! Metrics are computed at full precision; values are rounded only when a
//! view is built. Cards use [`headline`] (ceiling), tables and charts use
//! [`display`] (nearest).

use chrono::{Datelike, Duration, NaiveDate};
use shared::messages::{
    BlockDimensions, BlockRow, CampList, ComparisonBar, CurrentPanel, DimensionScores, ForecastDay,
    ForecastPanel, FriCard, FsiCard, FwiCard, MonthlyPanel, MonthlyPoint, Narrative, NoData,
    Overview, OverviewRow, Panel, SiteView, TimeWindow, WindowView,
};
use shared::metrics::{
    classify_fri, classify_fsi, classify_fwi, display, fri, headline, FwiClass,
};
use shared::models::{BlockRecord, CampSummary, LngLat, SurveyScores, DIMENSIONS};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::boundaries::BoundaryView;
use crate::sources::{Climatology, ClimatologySource, WeatherSource, MONTH_NAMES};
use crate::state::AppState;

#[derive(Clone)]
pub struct Dashboard {
    state: Arc<AppState>,
    weather: Arc<dyn WeatherSource>,
    climatology: Arc<dyn ClimatologySource>,
    forecast_days: u32,
}

/// Local calendar date used for "current" views.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn no_data(camp: &str, message: &str) -> NoData {
    NoData {
        camp: camp.to_string(),
        message: message.to_string(),
    }
}

impl Dashboard {
    pub fn new(
        state: Arc<AppState>,
        weather: Arc<dyn WeatherSource>,
        climatology: Arc<dyn ClimatologySource>,
        forecast_days: u32,
    ) -> Self {
        Dashboard {
            state,
            weather,
            climatology,
            forecast_days,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn camps(&self) -> CampList {
        CampList {
            camps: self.state.camp_names(),
        }
    }

    pub fn overview(&self) -> Overview {
        overview(&self.state.camps)
    }

    /// Only selectable camps with a summary row have views.
    fn summary(&self, camp: &str) -> Result<&CampSummary, NoData> {
        if self.state.blocks_for(camp).next().is_none() {
            return Err(no_data(camp, "No data available"));
        }
        self.state
            .camp(camp)
            .ok_or_else(|| no_data(camp, "No summary data"))
    }

    pub async fn site(&self, camp: &str, today: NaiveDate) -> Result<SiteView, NoData> {
        let summary = self.summary(camp)?;

        let weather = match self.weather.noon_weather(summary.position, today).await {
            Ok(record) => Some(record.details()),
            Err(err) => {
                log::warn!("No weather details for {}: {}", camp, err);
                None
            }
        };

        let blocks: Vec<&BlockRecord> = self.state.blocks_for(camp).collect();
        let (fsi, fwi, fri) = cards(summary, weather, today);

        Ok(SiteView {
            camp: camp.to_string(),
            contacts: self.state.contacts_for(camp),
            fsi,
            fwi,
            fri,
            blocks: block_rows(&blocks),
            block_dimensions: block_dimensions(&blocks),
        })
    }

    pub async fn window(
        &self,
        camp: &str,
        window: TimeWindow,
        today: NaiveDate,
    ) -> Result<WindowView, NoData> {
        let summary = self.summary(camp)?;

        let view = match window {
            TimeWindow::Monthly => {
                let climatology = self
                    .climatology
                    .monthly_climatology(summary.position, today.year())
                    .await;
                monthly_panel(camp, summary.fsi, &climatology)
            }
            TimeWindow::Current => current_panel(&self.state.camps, camp),
            TimeWindow::Forecasted => {
                let days = self.forecast_fwi(summary.position, today).await;
                forecast_panel(camp, summary.fsi, &days)
            }
        };
        Ok(view)
    }

    /// FWI for the days after `today`, fetched one at a time.
    async fn forecast_fwi(&self, position: LngLat, today: NaiveDate) -> Vec<(NaiveDate, Option<f64>)> {
        let mut days = Vec::with_capacity(self.forecast_days as usize);
        for offset in 1..=i64::from(self.forecast_days) {
            let day = today + Duration::days(offset);
            let fwi = match self.weather.noon_weather(position, day).await {
                Ok(record) => Some(record.fwi()),
                Err(err) => {
                    log::warn!("No forecast weather for {}: {}", day, err);
                    None
                }
            };
            days.push((day, fwi));
        }
        days
    }

    pub fn boundary(&self, camp: &str) -> Result<BoundaryView, NoData> {
        self.state
            .boundaries
            .view(camp)
            .ok_or_else(|| no_data(camp, "No boundary available"))
    }
}

pub fn overview(camps: &[CampSummary]) -> Overview {
    let rows = camps
        .iter()
        .map(|camp| OverviewRow {
            camp: camp.camp_name.clone(),
            fsi: display(camp.fsi),
            fwi: camp.current.map(|c| headline(c.fwi())),
            fri: camp.current.map(|c| display(c.fri())),
            fri_class: camp.current.map(|c| c.fri_class()),
        })
        .collect();

    Overview {
        rows,
        centre: LngLat::bbox_centre(camps.iter().map(|c| &c.position)),
    }
}

/// The three headline cards. Each class is that of the value shown.
pub fn cards(
    summary: &CampSummary,
    weather: Option<String>,
    today: NaiveDate,
) -> (FsiCard, FwiCard, FriCard) {
    let fsi_value = headline(summary.fsi);
    let fwi_value = summary.current.map(|c| headline(c.fwi()));
    let fri_value = summary.current.map(|c| headline(c.fri()));
    let fri_class = fri_value.map(|v| classify_fri(v as f64));

    let fsi = FsiCard {
        value: fsi_value,
        class: classify_fsi(fsi_value as f64),
        dimensions: dimension_scores(&summary.dimensions),
    };

    let fwi = FwiCard {
        value: fwi_value,
        short_class: fwi_value.map(|v| classify_fwi(v as f64).short_label()),
        weather,
        last_update: format!("{} 13:00 LST", today.format("%Y-%m-%d")),
    };

    let fri = FriCard {
        value: fri_value,
        short_class: fri_class.map(|c| c.short_label()),
        formula: fwi_value.map(|fwi| {
            format!(
                "FRI = FSI * (1 + (FWI/100)) = {} * (1 + ({}/100))",
                fsi_value, fwi
            )
        }),
        severity: fri_class,
    };

    (fsi, fwi, fri)
}

fn dimension_scores(scores: &SurveyScores) -> DimensionScores {
    let ceil = |v: Option<f64>| headline(v.unwrap_or(0.0));
    DimensionScores {
        environment: ceil(scores.environment),
        fuel: ceil(scores.fuel),
        behaviour: ceil(scores.behaviour),
        response: ceil(scores.response),
    }
}

pub fn block_rows(blocks: &[&BlockRecord]) -> Vec<BlockRow> {
    blocks
        .iter()
        .map(|b| BlockRow {
            block: b.block.clone(),
            fsi: display(b.fsi()),
            fsi_class: classify_fsi(b.fsi()),
        })
        .collect()
}

/// Mean of each sub-score per block name; missing scores are skipped.
pub fn block_dimensions(blocks: &[&BlockRecord]) -> Vec<BlockDimensions> {
    let mut sums: BTreeMap<&str, [(f64, u32); 4]> = BTreeMap::new();
    for b in blocks {
        let entry = sums.entry(b.block.as_str()).or_insert([(0.0, 0); 4]);
        for (acc, score) in entry.iter_mut().zip(b.scores.as_array()) {
            if let Some(v) = score {
                acc.0 += v;
                acc.1 += 1;
            }
        }
    }

    sums.into_iter()
        .map(|(block, acc)| BlockDimensions {
            block: block.to_string(),
            scores: DIMENSIONS
                .iter()
                .zip(acc)
                .map(|(dim, (sum, n))| (*dim, (n > 0).then(|| display(sum / n as f64))))
                .collect(),
        })
        .collect()
}

/// `"Low FWI: Jan: 12, Feb: 15. Severe FWI: Jul: 33."`, values ceiled.
pub fn fwi_narrative(labels: &[&str], values: &[f64]) -> String {
    [FwiClass::Low, FwiClass::Moderate, FwiClass::Severe]
        .iter()
        .filter_map(|class| {
            let items: Vec<String> = labels
                .iter()
                .zip(values)
                .filter(|(_, v)| classify_fwi(**v) == *class)
                .map(|(label, v)| format!("{}: {}", label, headline(*v)))
                .collect();
            if items.is_empty() {
                None
            } else {
                Some(format!("{} FWI: {}.", class.narrative_group(), items.join(", ")))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn monthly_panel(camp: &str, fsi: f64, climatology: &Climatology) -> WindowView {
    let fwi: Vec<f64> = climatology
        .months
        .iter()
        .map(|m| ((m.fwi() * 100.0).round() / 100.0).max(0.0))
        .collect();

    let months = MONTH_NAMES
        .iter()
        .zip(&fwi)
        .map(|(month, fwi)| {
            let value = display(fri(fsi, *fwi));
            let risk = classify_fri(value as f64);
            MonthlyPoint {
                month: *month,
                fwi: *fwi,
                fri: value,
                risk,
                color: risk.color(),
            }
        })
        .collect();

    let placeholder = climatology.is_placeholder();
    let mut text = fwi_narrative(&MONTH_NAMES, &fwi);
    if placeholder {
        text.push_str(" Climatology is unavailable, values are placeholders.");
    }

    WindowView {
        panel: Panel::Monthly(MonthlyPanel {
            year: climatology.year,
            title: format!(
                "Monthly Fire Risk Index ({}) for {}",
                climatology.year, camp
            ),
            months,
            placeholder,
        }),
        narrative: Narrative {
            heading: "Monthly Fire Risk Index".to_string(),
            text,
        },
    }
}

/// Camps with a current FRI, highest first.
pub fn current_panel(camps: &[CampSummary], selected: &str) -> WindowView {
    let mut ranked: Vec<(&CampSummary, f64)> = camps
        .iter()
        .filter_map(|c| c.current.map(|current| (c, current.fri())))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let bars: Vec<ComparisonBar> = ranked
        .iter()
        .filter_map(|(camp, fri)| {
            Some(ComparisonBar {
                camp: camp.camp_name.clone(),
                fri: display(*fri),
                fri_class: camp.current?.fri_class(),
                selected: camp.camp_name == selected,
            })
        })
        .collect();

    let total = bars.len();
    let position = bars.iter().position(|b| b.selected);
    let rank = position.map(|i| i + 1);

    let (title, text) = match position {
        Some(i) => (
            format!("Current FRI Comparison (Rank {}/{})", i + 1, total),
            format!(
                "{} is at {} ({}), ranking {} of {} camps.",
                selected,
                bars[i].fri,
                bars[i].fri_class,
                i + 1,
                total
            ),
        ),
        None => (
            "Current FRI Comparison".to_string(),
            format!("{} has no current fire risk, weather data is unavailable.", selected),
        ),
    };

    WindowView {
        panel: Panel::Current(CurrentPanel {
            title,
            bars,
            rank,
            total,
        }),
        narrative: Narrative {
            heading: "Current Fire Risk Summary".to_string(),
            text,
        },
    }
}

pub fn forecast_panel(camp: &str, fsi: f64, days: &[(NaiveDate, Option<f64>)]) -> WindowView {
    let n = days.len();
    let days: Vec<ForecastDay> = days
        .iter()
        .map(|(day, fwi)| {
            let value = fwi.map(|fwi| display(fri(fsi, fwi)));
            ForecastDay {
                date: day.format("%b %d").to_string(),
                fri: value,
                risk: value.map(|v| classify_fri(v as f64)),
            }
        })
        .collect();

    let missing = days.iter().filter(|d| d.fri.is_none()).count();
    let text = if missing == 0 {
        "Daily FRI at 13:00 local time, classified by risk.".to_string()
    } else {
        format!("Weather data is unavailable for {} of {} days.", missing, n)
    };

    WindowView {
        panel: Panel::Forecasted(ForecastPanel {
            title: format!("{}-Day FRI Forecast for {}", n, camp),
            days,
        }),
        narrative: Narrative {
            heading: format!("{}-Day Fire Risk Index Forecast", n),
            text,
        },
    }
}
