use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;

use config::Config;
use dashboard::Dashboard;
use state::{AppState, SurveyData};

mod boundaries;
mod cli;
mod config;
mod dashboard;
mod datasets;
mod error;
mod joins;
mod nasa_power;
mod open_meteo;
mod retry;
mod server;
mod sources;
mod state;
mod wttr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();
    let config = config::config();

    match args.cmd {
        Command::Http { address } => {
            let dashboard = load_dashboard(config, dashboard::today()).await?;
            server::run(address, dashboard).await;
        }
        Command::Overview => {
            let dashboard = load_dashboard(config, dashboard::today()).await?;
            print_json(&dashboard.overview())?;
        }
        Command::Site(site_args) => {
            let today = site_args.date.unwrap_or_else(dashboard::today);
            let dashboard = load_dashboard(config, today).await?;
            let camp = &site_args.camp;
            match site_args.window {
                Some(window) => match dashboard.window(camp, window, today).await {
                    Ok(view) => print_json(&view)?,
                    Err(no_data) => anyhow::bail!("{}: {}", no_data.camp, no_data.message),
                },
                None => match dashboard.site(camp, today).await {
                    Ok(view) => print_json(&view)?,
                    Err(no_data) => anyhow::bail!("{}: {}", no_data.camp, no_data.message),
                },
            }
        }
        Command::Check => {
            let data = SurveyData::load(config).context("Invalid data files")?;
            let state = AppState {
                blocks: data.blocks,
                boundaries: data.boundaries,
                ..AppState::default()
            };
            println!(
                "{} located blocks in {} selectable camps",
                state.blocks.len(),
                state.camp_names().len()
            );
            println!("{} camp summaries with coordinates", data.sites.len());
            println!("{} camp boundaries", state.boundaries.len());
            for site in &data.sites {
                if state.boundaries.for_camp(&site.camp_name).is_empty() {
                    log::warn!("{} has no boundary", site.camp_name);
                }
            }
        }
    }

    Ok(())
}

async fn load_dashboard(config: &Config, today: NaiveDate) -> anyhow::Result<Dashboard> {
    let weather = sources::weather_source(config).context("Failed to build weather client")?;
    let climatology =
        sources::climatology_source(config).context("Failed to build climatology client")?;

    let state = AppState::load(config, weather.as_ref(), today)
        .await
        .context("Failed to load datasets")?;

    Ok(Dashboard::new(
        Arc::new(state),
        weather,
        climatology,
        config.forecast_days,
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
