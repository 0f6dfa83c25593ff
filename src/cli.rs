//! Command-line interface parsing for matchboard
//!
//! Global options pick the competition, day and API access; subcommands pick
//! what to show. With no subcommand the full board is shown.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::api::UPSTREAM_BASE_URL;
use crate::config::{Config, ConfigError, RelayConfig, DEFAULT_LISTEN_ADDR, DEFAULT_RELAY_PREFIX};
use crate::dashboard::Selection;
use crate::data::{all_competitions, get_competition_by_code, Competition, RankBy, DEFAULT_COMPETITION};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The competition code is not one the free tier offers
    #[error("Invalid league: '{0}'. Valid leagues: {codes}", codes = valid_codes())]
    InvalidLeague(String),

    /// The date is not YYYY-MM-DD
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),
}

fn valid_codes() -> String {
    all_competitions()
        .iter()
        .map(|c| c.code)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Football fixtures, tables and scorers from football-data.org
#[derive(Parser, Debug)]
#[command(name = "matchboard")]
#[command(about = "Football fixtures, tables and scorer rankings with a local cache")]
#[command(version)]
pub struct Cli {
    /// Competition code: CL, PL, PD, BL1, SA or FL1
    #[arg(long, global = true, default_value = DEFAULT_COMPETITION, value_parser = parse_league_arg)]
    pub league: Competition,

    /// Day to show matches for (YYYY-MM-DD, UTC). Defaults to today.
    #[arg(long, global = true, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// API base URL; point it at a relay to keep the token off this machine
    #[arg(long, global = true, env = "FOOTBALL_API_URL", default_value = UPSTREAM_BASE_URL)]
    pub base_url: String,

    /// football-data.org API token
    #[arg(long, global = true, env = "FOOTBALL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Cache directory (defaults to the XDG cache directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Matches, standings and top scorers for the league and day
    Board {
        #[arg(long, value_enum, default_value_t = RankArg::Goals)]
        by: RankArg,
    },
    /// Matches for the league and day
    Matches,
    /// League table
    Standings,
    /// Top ten players by goals or assists
    Scorers {
        #[arg(long, value_enum, default_value_t = RankArg::Goals)]
        by: RankArg,
    },
    /// Lineups, goals, cards and substitutions of one match
    Detail {
        /// Match id as shown in match lists
        id: u64,
    },
    /// Every match on the day across competitions
    Today,
    /// A team's matches
    Team {
        /// Team id
        id: u64,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Delete cached API responses
    ClearCache,
    /// Run the relay that adds the API token to forwarded requests
    Serve {
        /// Address to listen on
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        addr: String,
        /// Path prefix to serve under
        #[arg(long, default_value = DEFAULT_RELAY_PREFIX)]
        prefix: String,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Board { by: RankArg::Goals }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankArg {
    Goals,
    Assists,
}

impl From<RankArg> for RankBy {
    fn from(arg: RankArg) -> Self {
        match arg {
            RankArg::Goals => RankBy::Goals,
            RankArg::Assists => RankBy::Assists,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    Scheduled,
    Live,
    Finished,
}

impl StatusArg {
    /// Value of the API's `status` filter
    pub fn as_api_str(&self) -> &'static str {
        match self {
            StatusArg::Scheduled => "SCHEDULED",
            StatusArg::Live => "LIVE",
            StatusArg::Finished => "FINISHED",
        }
    }
}

/// Parses a competition code. Codes are upper case, as the API uses them.
pub fn parse_league_arg(s: &str) -> Result<Competition, CliError> {
    get_competition_by_code(s)
        .copied()
        .ok_or_else(|| CliError::InvalidLeague(s.to_string()))
}

pub fn parse_date_arg(s: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| CliError::InvalidDate(s.to_string()))
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }

    /// Settings for the API client and cache
    pub fn client_config(&self) -> Config {
        Config {
            base_url: self.base_url.clone(),
            api_token: self.api_key.clone(),
            cache_dir: self.cache_dir.clone(),
        }
    }

    /// Settings for the relay; `--base-url` is the upstream it forwards to
    pub fn relay_config(&self, addr: &str, prefix: &str) -> Result<RelayConfig, ConfigError> {
        RelayConfig::new(self.api_key.clone(), self.base_url.clone(), prefix, addr)
    }

    /// The league and day to show, with `today` used when no date was given
    pub fn selection(&self, today: NaiveDate) -> Selection {
        Selection::new(self.league.code, self.date.unwrap_or(today))
    }
}
