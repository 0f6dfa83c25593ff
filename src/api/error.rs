use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - check the API token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - {}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!("wait {} seconds before retrying", wait.as_secs()),
        None => "please wait before retrying".to_string(),
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Maps a non-success response to an error
    ///
    /// `retry_after` is the raw `Retry-After` header, if the response had one.
    pub fn from_response(status: StatusCode, retry_after: Option<&str>, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited {
                retry_after: retry_after
                    .and_then(parse_retry_after_header)
                    .or_else(|| parse_wait_message(body)),
            },
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }

    /// How long the upstream asked us to wait, when it said
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Parses a delta-seconds `Retry-After` value
fn parse_retry_after_header(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Pulls the wait out of messages like "You reached your request limit. Wait 30 seconds."
///
/// The wording is not a stable contract; the header is preferred whenever present.
fn parse_wait_message(body: &str) -> Option<Duration> {
    static WAIT_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = WAIT_PATTERN
        .get_or_init(|| Regex::new(r"(?i)wait\s+(\d+)\s*sec").expect("wait pattern is valid"));

    pattern
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|secs| secs.as_str().parse::<u64>().ok())
        .map(Duration::from_secs)
}
