use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shared::messages::TimeWindow;

#[derive(Debug, Parser)]
#[command(about = "Fire risk dashboard CLI.")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the dashboard API
    Http {
        #[arg(env = "FIRERISK_SERVER_ADDRESS", default_value = "127.0.0.1:3001")]
        address: std::net::SocketAddr,
    },
    /// Print the all-camps overview as JSON
    Overview,
    /// Print a camp's site view, or one of its time windows, as JSON
    Site(SiteArgs),
    /// Load and validate the data files, without any weather request
    Check,
}

#[derive(Debug, Parser)]
pub struct SiteArgs {
    pub camp: String,
    /// monthly, current or forecasted
    #[arg(long, value_parser = parse_window)]
    pub window: Option<TimeWindow>,
    /// Reference date, defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

fn parse_window(s: &str) -> Result<TimeWindow, String> {
    s.parse().map_err(|_| {
        format!(
            "unknown window `{}`, expected {}, {} or {}",
            s,
            TimeWindow::Monthly,
            TimeWindow::Current,
            TimeWindow::Forecasted
        )
    })
}
