//! matchboard - football fixtures, tables and scorers in the terminal
//!
//! Reads from football-data.org (directly or through the relay) and caches
//! responses locally. `matchboard serve` runs the relay itself.

use std::io;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use matchboard::api::FootballClient;
use matchboard::cli::{Cli, Command};
use matchboard::config::Config;
use matchboard::dashboard::Dashboard;
use matchboard::data::RankBy;
use matchboard::relay::Relay;
use matchboard::report;

/// Logs go to stderr so reports on stdout stay clean. `RUST_LOG` overrides the level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn open_dashboard(config: &Config) -> Result<Dashboard<FootballClient>> {
    let cache = config.cache_manager()?;
    info!(base_url = %config.base_url, "Opening dashboard");
    Ok(Dashboard::new(FootballClient::from_config(config), cache))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    let config = cli.client_config();
    let selection = cli.selection(Utc::now().date_naive());
    let title = format!("{} - {}", cli.league.name, selection.date.format("%Y-%m-%d"));

    let output = match cli.command() {
        Command::Serve { addr, prefix } => {
            let relay_config = cli.relay_config(&addr, &prefix)?;
            Relay::new(relay_config)
                .run()
                .await
                .context("Relay stopped")?;
            return Ok(());
        }
        Command::ClearCache => {
            let removed = config
                .cache_manager()?
                .clear_all()
                .context("Failed to clear cache")?;
            format!("Removed {} cached entries\n", removed)
        }
        Command::Board { by } => {
            let dashboard = open_dashboard(&config)?;
            match dashboard.load_board(selection).await {
                Some(board) => report::board_report(&board, by.into()),
                // Only happens when another load superseded this one
                None => String::new(),
            }
        }
        Command::Matches => {
            let listing = open_dashboard(&config)?
                .load_matches(&selection.league, selection.date)
                .await;
            report::matches_report(&title, &listing)
        }
        Command::Standings => {
            let listing = open_dashboard(&config)?
                .load_standings(&selection.league)
                .await;
            report::standings_report(&listing)
        }
        Command::Scorers { by } => {
            let listing = open_dashboard(&config)?
                .load_scorers(&selection.league)
                .await;
            report::scorers_report(&listing, RankBy::from(by))
        }
        Command::Detail { id } => {
            let detail = open_dashboard(&config)?.load_match_detail(id).await;
            report::detail_report(detail.as_ref())
        }
        Command::Today => {
            let title = format!("All competitions - {}", selection.date.format("%Y-%m-%d"));
            let listing = open_dashboard(&config)?.load_day(selection.date).await;
            report::matches_report(&title, &listing)
        }
        Command::Team { id, status } => {
            let listing = open_dashboard(&config)?
                .load_team_matches(id, status.map(|s| s.as_api_str()))
                .await;
            report::matches_report(&format!("Team {}", id), &listing)
        }
    };

    print!("{}", output);
    Ok(())
}
