//! Core data models for the football-data.org v4 API
//!
//! This module contains the types used throughout the application for
//! representing matches, match detail, standings and scorer rankings. Field
//! names follow the API's camelCase wire format; unknown fields are ignored.

pub mod competition;
pub mod stats;

pub use competition::{all_competitions, get_competition_by_code, Competition, DEFAULT_COMPETITION};
pub use stats::{rank_scorers, table_zone, RankBy, TableZone};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A club or national team
///
/// Every field is null for a knockout slot whose team isn't decided yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    /// Three-letter abbreviation
    #[serde(default)]
    pub tla: Option<String>,
    /// Crest image URL
    #[serde(default)]
    pub crest: Option<String>,
}

impl Team {
    /// Short name if the API has one, otherwise the full name
    pub fn display_name(&self) -> &str {
        self.short_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("?")
    }
}

/// Home/away goal counts. Both are null before kick-off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    /// HOME_TEAM, AWAY_TEAM, DRAW, or null while undecided
    #[serde(default)]
    pub winner: Option<String>,
    /// REGULAR, EXTRA_TIME, PENALTY_SHOOTOUT
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub full_time: ScoreLine,
    #[serde(default)]
    pub half_time: ScoreLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Timed,
    Live,
    InPlay,
    Paused,
    Finished,
    Postponed,
    Suspended,
    Cancelled,
    Awarded,
    #[serde(other)]
    Unknown,
}

impl MatchStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, MatchStatus::Live | MatchStatus::InPlay | MatchStatus::Paused)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionRef {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referee {
    pub id: u64,
    pub name: String,
    /// REFEREE, ASSISTANT_REFEREE_N1, FOURTH_OFFICIAL, VIDEO_ASSISTANT_REFEREE_N1, ...
    #[serde(rename = "type", default)]
    pub role: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
}

/// A fixture as it appears in match lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: u64,
    pub utc_date: DateTime<Utc>,
    pub status: MatchStatus,
    #[serde(default)]
    pub matchday: Option<u32>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub competition: Option<CompetitionRef>,
    pub home_team: Team,
    pub away_team: Team,
    #[serde(default)]
    pub score: Score,
    #[serde(default)]
    pub referees: Vec<Referee>,
}

impl Match {
    /// Calendar day of kick-off in UTC
    pub fn utc_day(&self) -> NaiveDate {
        self.utc_date.date_naive()
    }
}

/// A player as listed in lineups and scorer rankings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u64,
    pub name: String,
    /// Goalkeeper, Defence, Midfield, Offence
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub shirt_number: Option<u32>,
}

/// Just enough to name someone in a match event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coach {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub team: Team,
    #[serde(default)]
    pub coach: Option<Coach>,
    #[serde(default)]
    pub lineup: Vec<Player>,
    #[serde(default)]
    pub substitutes: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub minute: Option<u32>,
    #[serde(default)]
    pub injury_time: Option<u32>,
    /// REGULAR, OWN, PENALTY
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub team: Team,
    pub scorer: PersonRef,
    #[serde(default)]
    pub assist: Option<PersonRef>,
    #[serde(default)]
    pub score: Option<ScoreLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default)]
    pub minute: Option<u32>,
    pub team: Team,
    pub player: PersonRef,
    /// YELLOW, YELLOW_RED, RED
    pub card: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    #[serde(default)]
    pub minute: Option<u32>,
    pub team: Team,
    pub player_out: PersonRef,
    pub player_in: PersonRef,
}

/// A match with lineups and events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    #[serde(flatten)]
    pub summary: Match,
    #[serde(default)]
    pub lineups: Vec<Lineup>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchesResponse {
    #[serde(default)]
    pub matches: Vec<Match>,
}

/// One row of a league table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub position: u32,
    pub team: Team,
    pub played_games: u32,
    #[serde(default)]
    pub form: Option<String>,
    pub won: u32,
    pub draw: u32,
    pub lost: u32,
    pub points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
}

/// A table for one stage/group. `kind` is TOTAL, HOME or AWAY.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingGroup {
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub table: Vec<Standing>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingsResponse {
    #[serde(default)]
    pub standings: Vec<StandingGroup>,
}

impl StandingsResponse {
    /// The overall league table: the first TOTAL group, or the first group of any kind
    pub fn into_total_table(self) -> Vec<Standing> {
        let mut groups = self.standings;
        let index = groups
            .iter()
            .position(|g| g.kind.as_deref() == Some("TOTAL"))
            .unwrap_or(0);
        if index < groups.len() {
            groups.swap_remove(index).table
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorer {
    pub player: Player,
    pub team: Team,
    #[serde(default)]
    pub played_matches: Option<u32>,
    #[serde(default)]
    pub goals: Option<u32>,
    #[serde(default)]
    pub assists: Option<u32>,
    #[serde(default)]
    pub penalties: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScorersResponse {
    #[serde(default)]
    pub scorers: Vec<Scorer>,
}
