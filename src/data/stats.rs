//! Scorer rankings and league table zones

use super::Scorer;

/// How many players a ranking shows
pub const RANKING_SIZE: usize = 10;

/// Statistic a scorer ranking is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankBy {
    #[default]
    Goals,
    Assists,
}

impl RankBy {
    /// Value of this statistic for a scorer; missing counts as zero
    pub fn value(&self, scorer: &Scorer) -> u32 {
        match self {
            RankBy::Goals => scorer.goals.unwrap_or(0),
            RankBy::Assists => scorer.assists.unwrap_or(0),
        }
    }
}

/// Orders scorers by `by`, highest first, and keeps the top ten
///
/// Ties keep the API's order. An assist ranking leaves out players with no assists.
pub fn rank_scorers(scorers: &[Scorer], by: RankBy) -> Vec<Scorer> {
    let mut ranked: Vec<Scorer> = scorers
        .iter()
        .filter(|s| by != RankBy::Assists || by.value(s) > 0)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| by.value(b).cmp(&by.value(a)));
    ranked.truncate(RANKING_SIZE);
    ranked
}

/// Qualification or relegation band of a table position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableZone {
    ChampionsLeague,
    EuropaLeague,
    Relegation,
    None,
}

/// Band for `position` (1-based) in a table of `table_len` rows
pub fn table_zone(position: u32, table_len: usize) -> TableZone {
    let position = position as usize;
    if position <= 4 {
        TableZone::ChampionsLeague
    } else if position <= 6 {
        TableZone::EuropaLeague
    } else if position >= table_len.saturating_sub(2) {
        TableZone::Relegation
    } else {
        TableZone::None
    }
}
