//! Static competition data
//!
//! The competitions reachable on the football-data.org free tier: the top five
//! European leagues plus the Champions League.

/// A league or tournament, identified by its API code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Competition {
    /// API competition code (e.g. "PL")
    pub code: &'static str,
    /// Human-readable name
    pub name: &'static str,
}

/// Code used when none is given
pub const DEFAULT_COMPETITION: &str = "PL";

pub static COMPETITIONS: [Competition; 6] = [
    Competition {
        code: "CL",
        name: "UEFA Champions League",
    },
    Competition {
        code: "PL",
        name: "Premier League",
    },
    Competition {
        code: "PD",
        name: "La Liga",
    },
    Competition {
        code: "BL1",
        name: "Bundesliga",
    },
    Competition {
        code: "SA",
        name: "Serie A",
    },
    Competition {
        code: "FL1",
        name: "Ligue 1",
    },
];

pub fn all_competitions() -> &'static [Competition] {
    &COMPETITIONS
}

/// Looks up a competition by its exact (case-sensitive) code
pub fn get_competition_by_code(code: &str) -> Option<&'static Competition> {
    COMPETITIONS.iter().find(|c| c.code == code)
}
