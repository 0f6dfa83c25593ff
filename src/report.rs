//! Plain-text reports for the terminal
//!
//! Each function returns the full text so callers decide where it goes.

use std::fmt::Write;

use crate::dashboard::{Board, Listing};
use crate::data::{
    get_competition_by_code, rank_scorers, table_zone, Match, MatchDetail, MatchStatus, RankBy,
    Scorer, Standing, TableZone,
};

fn status_label(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Scheduled | MatchStatus::Timed => "",
        MatchStatus::Live | MatchStatus::InPlay => "LIVE",
        MatchStatus::Paused => "HT",
        MatchStatus::Finished => "FT",
        MatchStatus::Postponed => "PST",
        MatchStatus::Suspended => "SUSP",
        MatchStatus::Cancelled => "CANC",
        MatchStatus::Awarded => "AWD",
        MatchStatus::Unknown => "?",
    }
}

fn zone_marker(zone: TableZone) -> char {
    match zone {
        TableZone::ChampionsLeague => '*',
        TableZone::EuropaLeague => '+',
        TableZone::Relegation => 'v',
        TableZone::None => ' ',
    }
}

/// One line per match: kick-off, teams, score and status
pub fn match_line(m: &Match) -> String {
    let score = match (m.score.full_time.home, m.score.full_time.away) {
        (Some(home), Some(away)) => format!("{} - {}", home, away),
        _ => "vs".to_string(),
    };
    let line = format!(
        "{:>8}  {} {:>20} {:^7} {:<20} {}",
        m.id,
        m.utc_date.format("%H:%M"),
        m.home_team.display_name(),
        score,
        m.away_team.display_name(),
        status_label(m.status),
    );
    line.trim_end().to_string()
}

/// Writes the notice or the "nothing here" line for an empty listing
fn write_empty<T>(out: &mut String, listing: &Listing<T>, empty: &str) {
    match listing.notice {
        Some(ref notice) => {
            let _ = writeln!(out, "  ! {}", notice);
        }
        None => {
            let _ = writeln!(out, "  {}", empty);
        }
    }
}

pub fn matches_report(title: &str, listing: &Listing<Match>) -> String {
    let mut out = format!("{}\n", title);
    if listing.items.is_empty() {
        write_empty(&mut out, listing, "No matches.");
        return out;
    }
    for m in &listing.items {
        let _ = writeln!(out, "{}", match_line(m));
    }
    out
}

/// League table with a marker column for qualification and relegation
pub fn standings_report(listing: &Listing<Standing>) -> String {
    let mut out = String::from("Standings\n");
    if listing.items.is_empty() {
        write_empty(&mut out, listing, "No table available.");
        return out;
    }

    let _ = writeln!(
        out,
        "   {:>3}  {:<22} {:>3} {:>3} {:>3} {:>3} {:>7} {:>4} {:>4}",
        "#", "Team", "P", "W", "D", "L", "Goals", "GD", "Pts"
    );
    let len = listing.items.len();
    for row in &listing.items {
        let _ = writeln!(
            out,
            " {} {:>3}  {:<22} {:>3} {:>3} {:>3} {:>3} {:>7} {:>+4} {:>4}",
            zone_marker(table_zone(row.position, len)),
            row.position,
            row.team.display_name(),
            row.played_games,
            row.won,
            row.draw,
            row.lost,
            format!("{}:{}", row.goals_for, row.goals_against),
            row.goal_difference,
            row.points,
        );
    }
    let _ = writeln!(out, "  * Champions League  + Europa League  v Relegation");
    out
}

/// Top ten by `by`, numbered
pub fn scorers_report(listing: &Listing<Scorer>, by: RankBy) -> String {
    let heading = match by {
        RankBy::Goals => "Top scorers",
        RankBy::Assists => "Top assists",
    };
    let mut out = format!("{}\n", heading);

    let ranked = rank_scorers(&listing.items, by);
    if ranked.is_empty() {
        write_empty(&mut out, listing, "No players to rank.");
        return out;
    }
    for (rank, scorer) in ranked.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<26} {:<16} {:>3}",
            rank + 1,
            scorer.player.name,
            scorer.team.display_name(),
            by.value(scorer),
        );
    }
    out
}

fn minute(minute: Option<u32>, injury_time: Option<u32>) -> String {
    match (minute, injury_time) {
        (Some(m), Some(extra)) => format!("{}+{}'", m, extra),
        (Some(m), None) => format!("{}'", m),
        _ => "-".to_string(),
    }
}

pub fn detail_report(detail: Option<&MatchDetail>) -> String {
    let Some(detail) = detail else {
        return "Match detail unavailable.\n".to_string();
    };

    let m = &detail.summary;
    let mut out = String::new();
    if let Some(ref competition) = m.competition {
        let _ = write!(out, "{}", competition.name);
        if let Some(day) = m.matchday {
            let _ = write!(out, ", matchday {}", day);
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{}", match_line(m));
    if let (Some(home), Some(away)) = (m.score.half_time.home, m.score.half_time.away) {
        let _ = writeln!(out, "  Half time {} - {}", home, away);
    }
    if let Some(referee) = m.referees.first() {
        let _ = writeln!(out, "  Referee: {}", referee.name);
    }

    if !detail.goals.is_empty() {
        out.push_str("\nGoals\n");
        for goal in &detail.goals {
            let _ = write!(
                out,
                "  {:>6} {} ({})",
                minute(goal.minute, goal.injury_time),
                goal.scorer.name,
                goal.team.display_name()
            );
            match goal.kind.as_deref() {
                Some("PENALTY") => out.push_str(" pen"),
                Some("OWN") => out.push_str(" og"),
                _ => {}
            }
            if let Some(ref assist) = goal.assist {
                let _ = write!(out, ", assist {}", assist.name);
            }
            out.push('\n');
        }
    }

    if !detail.bookings.is_empty() {
        out.push_str("\nCards\n");
        for booking in &detail.bookings {
            let card = match booking.card.as_str() {
                "YELLOW" => "yellow",
                "YELLOW_RED" => "second yellow",
                "RED" => "red",
                other => other,
            };
            let _ = writeln!(
                out,
                "  {:>6} {} ({}) {}",
                minute(booking.minute, None),
                booking.player.name,
                booking.team.display_name(),
                card
            );
        }
    }

    if !detail.substitutions.is_empty() {
        out.push_str("\nSubstitutions\n");
        for sub in &detail.substitutions {
            let _ = writeln!(
                out,
                "  {:>6} {} on, {} off ({})",
                minute(sub.minute, None),
                sub.player_in.name,
                sub.player_out.name,
                sub.team.display_name()
            );
        }
    }

    for lineup in &detail.lineups {
        let _ = writeln!(out, "\n{} lineup", lineup.team.display_name());
        for player in &lineup.lineup {
            let number = player
                .shirt_number
                .map(|n| n.to_string())
                .unwrap_or_default();
            let position = player.position.as_deref().unwrap_or("");
            let _ = writeln!(out, "  {:>3} {:<26} {}", number, player.name, position);
        }
        if let Some(name) = lineup.coach.as_ref().and_then(|c| c.name.as_deref()) {
            let _ = writeln!(out, "  Coach: {}", name);
        }
    }

    out
}

pub fn board_report(board: &Board, by: RankBy) -> String {
    let league = &board.selection.league;
    let name = get_competition_by_code(league)
        .map(|c| c.name)
        .unwrap_or(league.as_str());
    let title = format!("{} - {}", name, board.selection.date.format("%A %d %B %Y"));

    let mut out = matches_report(&title, &board.matches);
    out.push('\n');
    out.push_str(&standings_report(&board.standings));
    out.push('\n');
    out.push_str(&scorers_report(&board.scorers, by));
    out
}
