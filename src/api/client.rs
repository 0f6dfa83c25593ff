//! football-data.org v4 API client
//!
//! Talks either to the upstream API directly (with a token) or to the relay,
//! which injects the token itself.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::ApiError;
use crate::config::Config;
use crate::data::{MatchDetail, MatchesResponse, ScorersResponse, StandingsResponse};

/// Base URL of the upstream API
pub const UPSTREAM_BASE_URL: &str = "https://api.football-data.org/v4";

/// Header carrying the API token
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Operations the dashboard needs from the football data API
#[async_trait]
pub trait FootballApi: Send + Sync {
    /// All matches of a competition, optionally for a given season start year
    async fn matches(
        &self,
        competition: &str,
        season: Option<u32>,
    ) -> Result<MatchesResponse, ApiError>;

    /// One match with lineups and events
    async fn match_detail(&self, match_id: u64) -> Result<MatchDetail, ApiError>;

    /// A team's matches, optionally filtered by status (SCHEDULED, LIVE, FINISHED)
    async fn team_matches(
        &self,
        team_id: u64,
        status: Option<&str>,
    ) -> Result<MatchesResponse, ApiError>;

    /// Matches across all available competitions on one day
    async fn matches_on(&self, date: NaiveDate) -> Result<MatchesResponse, ApiError>;

    async fn standings(&self, competition: &str) -> Result<StandingsResponse, ApiError>;

    async fn scorers(&self, competition: &str) -> Result<ScorersResponse, ApiError>;
}

/// HTTP implementation of [`FootballApi`]
#[derive(Debug, Clone)]
pub struct FootballClient {
    http_client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl FootballClient {
    /// Creates a client for `base_url`, sending `api_token` if there is one
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_url.clone(), config.api_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_value(&self, path: &str) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Requesting");

        let mut request = self
            .http_client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(ref token) = self.api_token {
            request = request.header(AUTH_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %url, status = %status, "Response received");

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status, retry_after.as_deref(), &body));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.get_value(path).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Unwraps `{ "match": {...} }` when present and checks the match has an id
fn parse_match_detail(value: Value) -> Result<MatchDetail, ApiError> {
    let value = match value {
        Value::Object(mut map) if map.contains_key("match") => {
            map.remove("match").unwrap_or(Value::Null)
        }
        other => other,
    };

    if value.get("id").map_or(true, Value::is_null) {
        return Err(ApiError::InvalidResponse(
            "match detail has no id".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl FootballApi for FootballClient {
    async fn matches(
        &self,
        competition: &str,
        season: Option<u32>,
    ) -> Result<MatchesResponse, ApiError> {
        let mut path = format!("/competitions/{}/matches", competition);
        if let Some(season) = season {
            path.push_str(&format!("?season={}", season));
        }
        let response: MatchesResponse = self.get_json(&path).await?;
        debug!(competition, count = response.matches.len(), "Matches received");
        Ok(response)
    }

    async fn match_detail(&self, match_id: u64) -> Result<MatchDetail, ApiError> {
        let value = self.get_value(&format!("/matches/{}", match_id)).await?;
        parse_match_detail(value)
    }

    async fn team_matches(
        &self,
        team_id: u64,
        status: Option<&str>,
    ) -> Result<MatchesResponse, ApiError> {
        let mut path = format!("/teams/{}/matches", team_id);
        if let Some(status) = status {
            path.push_str(&format!("?status={}", status));
        }
        self.get_json(&path).await
    }

    async fn matches_on(&self, date: NaiveDate) -> Result<MatchesResponse, ApiError> {
        self.get_json(&format!("/matches?date={}", date.format("%Y-%m-%d")))
            .await
    }

    async fn standings(&self, competition: &str) -> Result<StandingsResponse, ApiError> {
        self.get_json(&format!("/competitions/{}/standings", competition))
            .await
    }

    async fn scorers(&self, competition: &str) -> Result<ScorersResponse, ApiError> {
        let response: ScorersResponse = self
            .get_json(&format!("/competitions/{}/scorers", competition))
            .await?;
        debug!(competition, players = response.scorers.len(), "Scorers received");
        Ok(response)
    }
}
