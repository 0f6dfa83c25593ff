//! Cache key construction
//!
//! Keys are `football_<category>_<param>...`. Callers pass parameters in their
//! canonical form; nothing is normalized here.

use std::fmt;

use chrono::NaiveDate;

/// Prefix shared by every key this crate writes
pub const KEY_PREFIX: &str = "football";

/// Delimiter between key segments
const KEY_DELIMITER: &str = "_";

/// Kind of data a cache entry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Matches,
    Standings,
    Scorers,
    Detail,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Matches => "matches",
            Category::Standings => "standings",
            Category::Scorers => "scorers",
            Category::Detail => "detail",
        }
    }
}

/// A fully built cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Joins the prefix, category and parameters with `_`
    pub fn build(category: Category, params: &[&str]) -> Self {
        let mut segments = Vec::with_capacity(params.len() + 2);
        segments.push(KEY_PREFIX);
        segments.push(category.as_str());
        segments.extend_from_slice(params);
        Self(segments.join(KEY_DELIMITER))
    }

    /// Key for a competition's matches on one day
    pub fn matches(league: &str, date: NaiveDate) -> Self {
        let date = date.format("%Y-%m-%d").to_string();
        Self::build(Category::Matches, &[league, &date])
    }

    pub fn standings(league: &str) -> Self {
        Self::build(Category::Standings, &[league])
    }

    pub fn scorers(league: &str) -> Self {
        Self::build(Category::Scorers, &[league])
    }

    pub fn detail(match_id: u64) -> Self {
        Self::build(Category::Detail, &[&match_id.to_string()])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `key` belongs to this crate's namespace
    pub fn is_owned(key: &str) -> bool {
        key.strip_prefix(KEY_PREFIX)
            .is_some_and(|rest| rest.starts_with(KEY_DELIMITER))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
