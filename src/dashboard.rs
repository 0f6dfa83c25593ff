//! Dashboard service: API client plus read-through cache per selection
//!
//! Nothing here returns an error. Failed loads turn into empty listings with a
//! [`Notice`] the caller can show, and malformed match detail turns into `None`.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::api::{ApiError, FootballApi};
use crate::cache::{CacheKey, CacheManager};
use crate::data::{Match, MatchDetail, Scorer, Standing, StandingsResponse};
use crate::selection::SelectionTracker;

pub const MATCHES_TTL: Duration = Duration::from_secs(5 * 60);
pub const DETAIL_TTL: Duration = Duration::from_secs(5 * 60);
pub const STANDINGS_TTL: Duration = Duration::from_secs(15 * 60);
pub const SCORERS_TTL: Duration = Duration::from_secs(15 * 60);

/// Competition and day the dashboard is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub league: String,
    pub date: NaiveDate,
}

impl Selection {
    pub fn new(league: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            league: league.into(),
            date,
        }
    }
}

/// Why a listing came back empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    RateLimited { retry_after: Option<Duration> },
    Unavailable(String),
}

impl Notice {
    fn from_error(error: &ApiError) -> Self {
        if error.is_rate_limited() {
            Notice::RateLimited {
                retry_after: error.retry_after(),
            }
        } else {
            Notice::Unavailable(error.to_string())
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::RateLimited {
                retry_after: Some(wait),
            } => write!(
                f,
                "API rate limit reached, try again in {} seconds",
                wait.as_secs()
            ),
            Notice::RateLimited { retry_after: None } => {
                write!(f, "API rate limit reached, try again shortly")
            }
            Notice::Unavailable(reason) => write!(f, "Data unavailable: {}", reason),
        }
    }
}

/// A loaded list, possibly empty because the load failed
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub notice: Option<Notice>,
}

impl<T> Listing<T> {
    fn from_result(what: &str, result: Result<Vec<T>, ApiError>) -> Self {
        match result {
            Ok(items) => Self {
                items,
                notice: None,
            },
            Err(e) => {
                warn!(what, error = %e, "Load failed, showing empty list");
                Self {
                    items: Vec::new(),
                    notice: Some(Notice::from_error(&e)),
                }
            }
        }
    }
}

/// Everything shown for one selection
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub selection: Selection,
    pub matches: Listing<Match>,
    pub standings: Listing<Standing>,
    pub scorers: Listing<Scorer>,
}

pub struct Dashboard<A> {
    api: A,
    cache: CacheManager,
    selections: SelectionTracker,
}

impl<A: FootballApi> Dashboard<A> {
    pub fn new(api: A, cache: CacheManager) -> Self {
        Self {
            api,
            cache,
            selections: SelectionTracker::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Matches of `league` kicking off on `date` (UTC), cached
    pub async fn fetch_matches(&self, league: &str, date: NaiveDate) -> Result<Vec<Match>, ApiError> {
        self.cache
            .fetch_with_cache(&CacheKey::matches(league, date), MATCHES_TTL, || async {
                self.api.matches(league, None).await.map(|response| {
                    response
                        .matches
                        .into_iter()
                        .filter(|m| m.utc_day() == date)
                        .collect::<Vec<_>>()
                })
            })
            .await
    }

    /// The overall league table, cached
    pub async fn fetch_standings(&self, league: &str) -> Result<Vec<Standing>, ApiError> {
        self.cache
            .fetch_with_cache(&CacheKey::standings(league), STANDINGS_TTL, || async {
                self.api
                    .standings(league)
                    .await
                    .map(StandingsResponse::into_total_table)
            })
            .await
    }

    pub async fn fetch_scorers(&self, league: &str) -> Result<Vec<Scorer>, ApiError> {
        self.cache
            .fetch_with_cache(&CacheKey::scorers(league), SCORERS_TTL, || async {
                self.api.scorers(league).await.map(|response| response.scorers)
            })
            .await
    }

    pub async fn load_matches(&self, league: &str, date: NaiveDate) -> Listing<Match> {
        Listing::from_result("matches", self.fetch_matches(league, date).await)
    }

    pub async fn load_standings(&self, league: &str) -> Listing<Standing> {
        Listing::from_result("standings", self.fetch_standings(league).await)
    }

    pub async fn load_scorers(&self, league: &str) -> Listing<Scorer> {
        Listing::from_result("scorers", self.fetch_scorers(league).await)
    }

    /// Match detail, or `None` if it can't be loaded or makes no sense
    pub async fn load_match_detail(&self, match_id: u64) -> Option<MatchDetail> {
        let result = self
            .cache
            .fetch_with_cache(&CacheKey::detail(match_id), DETAIL_TTL, || {
                self.api.match_detail(match_id)
            })
            .await;

        match result {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(match_id, error = %e, "No match detail");
                None
            }
        }
    }

    /// Every match on `date` across the available competitions; not cached
    pub async fn load_day(&self, date: NaiveDate) -> Listing<Match> {
        let result = self.api.matches_on(date).await.map(|r| r.matches);
        Listing::from_result("matches of the day", result)
    }

    /// A team's matches, optionally filtered by status; not cached
    pub async fn load_team_matches(&self, team_id: u64, status: Option<&str>) -> Listing<Match> {
        let result = self
            .api
            .team_matches(team_id, status)
            .await
            .map(|r| r.matches);
        Listing::from_result("team matches", result)
    }

    /// Loads the whole board for `selection`
    ///
    /// Returns `None` if another board load started while this one was running.
    pub async fn load_board(&self, selection: Selection) -> Option<Board> {
        let token = self.selections.begin();
        debug!(league = %selection.league, date = %selection.date, sequence = token.sequence(), "Loading board");

        let matches = self.load_matches(&selection.league, selection.date).await;
        let (standings, scorers) = futures::join!(
            self.load_standings(&selection.league),
            self.load_scorers(&selection.league)
        );

        if !self.selections.is_current(token) {
            debug!(league = %selection.league, sequence = token.sequence(), "Selection superseded, discarding board");
            return None;
        }

        Some(Board {
            selection,
            matches,
            standings,
            scorers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{KeyValueStore, ManualClock, MemoryStore};
    use crate::data::fixtures::{match_json, scorer_json, standing_json};
    use crate::data::{MatchesResponse, ScorersResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const T0: i64 = 1_714_521_600_000;

    /// League that answers slowly
    const SLOW: &str = "CL";
    /// League whose scorers endpoint is rate limited
    const LIMITED: &str = "SA";
    /// League whose matches endpoint is rate limited
    const MATCHES_LIMITED: &str = "BL1";

    #[derive(Default)]
    struct FakeApi {
        match_calls: AtomicUsize,
        standings_calls: AtomicUsize,
        scorer_calls: AtomicUsize,
        detail_calls: AtomicUsize,
    }

    #[async_trait]
    impl FootballApi for FakeApi {
        async fn matches(
            &self,
            competition: &str,
            _season: Option<u32>,
        ) -> Result<MatchesResponse, ApiError> {
            self.match_calls.fetch_add(1, Ordering::SeqCst);
            if competition == SLOW {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            if competition == MATCHES_LIMITED {
                return Err(ApiError::RateLimited { retry_after: None });
            }
            Ok(serde_json::from_value(json!({
                "matches": [
                    match_json(1, "2024-05-01T11:30:00Z", "FINISHED"),
                    match_json(2, "2024-05-01T23:59:59Z", "TIMED"),
                    match_json(3, "2024-05-02T00:00:00Z", "TIMED"),
                ]
            }))?)
        }

        async fn match_detail(&self, match_id: u64) -> Result<MatchDetail, ApiError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            match match_id {
                404 => Err(ApiError::NotFound("no such match".to_string())),
                _ => Ok(serde_json::from_value(match_json(
                    match_id,
                    "2024-05-01T19:00:00Z",
                    "FINISHED",
                ))?),
            }
        }

        async fn team_matches(
            &self,
            _team_id: u64,
            _status: Option<&str>,
        ) -> Result<MatchesResponse, ApiError> {
            Err(ApiError::ServerError("down".to_string()))
        }

        async fn matches_on(&self, date: NaiveDate) -> Result<MatchesResponse, ApiError> {
            let kickoff = format!("{}T15:00:00Z", date.format("%Y-%m-%d"));
            Ok(serde_json::from_value(json!({
                "matches": [match_json(9, &kickoff, "TIMED")]
            }))?)
        }

        async fn standings(&self, _competition: &str) -> Result<StandingsResponse, ApiError> {
            self.standings_calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_value(json!({
                "standings": [
                    { "stage": "REGULAR_SEASON", "type": "HOME", "table": [standing_json(1, 65, "Man City", 50)] },
                    { "stage": "REGULAR_SEASON", "type": "TOTAL", "table": [
                        standing_json(1, 57, "Arsenal", 86),
                        standing_json(2, 65, "Man City", 85),
                    ] },
                ]
            }))?)
        }

        async fn scorers(&self, competition: &str) -> Result<ScorersResponse, ApiError> {
            self.scorer_calls.fetch_add(1, Ordering::SeqCst);
            if competition == LIMITED {
                return Err(ApiError::RateLimited {
                    retry_after: Some(Duration::from_secs(30)),
                });
            }
            Ok(serde_json::from_value(json!({
                "scorers": [scorer_json(1, "Haaland", 27, Some(5))]
            }))?)
        }
    }

    fn dashboard() -> (Dashboard<FakeApi>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let cache = CacheManager::with_store(Arc::new(MemoryStore::new())).with_clock(clock.clone());
        (Dashboard::new(FakeApi::default(), cache), clock)
    }

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn test_matches_are_filtered_to_the_selected_day() {
        let (dashboard, _) = dashboard();

        let listing = dashboard.load_matches("PL", may_first()).await;

        let ids: Vec<u64> = listing.items.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(listing.notice.is_none());
    }

    #[tokio::test]
    async fn test_matches_are_served_from_cache_within_ttl() {
        let (dashboard, clock) = dashboard();

        dashboard.load_matches("PL", may_first()).await;
        clock.advance(MATCHES_TTL - Duration::from_secs(1));
        dashboard.load_matches("PL", may_first()).await;
        assert_eq!(dashboard.api().match_calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        dashboard.load_matches("PL", may_first()).await;
        assert_eq!(dashboard.api().match_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_standings_use_total_table_and_longer_ttl() {
        let (dashboard, clock) = dashboard();

        let listing = dashboard.load_standings("PL").await;
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.items[0].team.display_name(), "Arsenal");

        // Past the match TTL but within the standings TTL
        clock.advance(Duration::from_secs(10 * 60));
        dashboard.load_standings("PL").await;
        assert_eq!(dashboard.api().standings_calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(5 * 60));
        dashboard.load_standings("PL").await;
        assert_eq!(dashboard.api().standings_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_shows_empty_list_and_caches_nothing() {
        let (dashboard, _) = dashboard();

        let listing = dashboard.load_scorers(LIMITED).await;
        assert!(listing.items.is_empty());
        assert_eq!(
            listing.notice,
            Some(Notice::RateLimited {
                retry_after: Some(Duration::from_secs(30))
            })
        );

        // Nothing was stored, so the next load asks again
        dashboard.load_scorers(LIMITED).await;
        assert_eq!(dashboard.api().scorer_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_match_list_writes_no_key() {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheManager::with_store(store.clone())
            .with_clock(Arc::new(ManualClock::new(T0)));
        let dashboard = Dashboard::new(FakeApi::default(), cache);

        let listing = dashboard.load_matches(MATCHES_LIMITED, may_first()).await;

        assert!(listing.items.is_empty());
        assert_eq!(listing.notice, Some(Notice::RateLimited { retry_after: None }));
        assert!(store.keys().unwrap().is_empty());
        assert!(store
            .get(CacheKey::matches(MATCHES_LIMITED, may_first()).as_str())
            .unwrap()
            .is_none());

        dashboard.load_matches(MATCHES_LIMITED, may_first()).await;
        assert_eq!(dashboard.api().match_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_is_refetched() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(CacheKey::scorers("PL").as_str(), "{not json")
            .unwrap();
        let cache = CacheManager::with_store(store.clone())
            .with_clock(Arc::new(ManualClock::new(T0)));
        let dashboard = Dashboard::new(FakeApi::default(), cache);

        let listing = dashboard.load_scorers("PL").await;

        assert_eq!(listing.items.len(), 1);
        assert_eq!(dashboard.api().scorer_calls.load(Ordering::SeqCst), 1);
        let raw = store.get(CacheKey::scorers("PL").as_str()).unwrap().unwrap();
        assert!(raw.contains("Haaland"));
    }

    #[tokio::test]
    async fn test_match_detail_is_cached_and_missing_detail_is_none() {
        let (dashboard, _) = dashboard();

        assert_eq!(dashboard.load_match_detail(7).await.unwrap().summary.id, 7);
        assert!(dashboard.load_match_detail(7).await.is_some());
        assert_eq!(dashboard.api().detail_calls.load(Ordering::SeqCst), 1);

        assert!(dashboard.load_match_detail(404).await.is_none());
    }

    #[tokio::test]
    async fn test_uncached_lists_report_failures() {
        let (dashboard, _) = dashboard();

        let team = dashboard.load_team_matches(57, Some("FINISHED")).await;
        assert!(team.items.is_empty());
        assert!(matches!(team.notice, Some(Notice::Unavailable(_))));

        let day = dashboard.load_day(may_first()).await;
        assert_eq!(day.items.len(), 1);
    }

    #[tokio::test]
    async fn test_board_combines_lists_and_keeps_failures_local() {
        let (dashboard, _) = dashboard();

        let board = dashboard
            .load_board(Selection::new(LIMITED, may_first()))
            .await
            .unwrap();

        assert_eq!(board.matches.items.len(), 2);
        assert_eq!(board.standings.items.len(), 2);
        assert!(board.scorers.items.is_empty());
        assert!(board.scorers.notice.is_some());
    }

    #[tokio::test]
    async fn test_latest_selection_wins() {
        let (dashboard, _) = dashboard();

        let (slow, fast) = tokio::join!(
            dashboard.load_board(Selection::new(SLOW, may_first())),
            dashboard.load_board(Selection::new("PL", may_first())),
        );

        assert!(slow.is_none());
        assert_eq!(fast.unwrap().selection.league, "PL");
    }

    #[test]
    fn test_notice_display() {
        let notice = Notice::RateLimited {
            retry_after: Some(Duration::from_secs(42)),
        };
        assert!(notice.to_string().contains("42 seconds"));
        assert!(Notice::RateLimited { retry_after: None }
            .to_string()
            .contains("shortly"));
        assert!(Notice::Unavailable("Server error: down".to_string())
            .to_string()
            .contains("Server error"));
    }
}
