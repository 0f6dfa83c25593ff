//! Runtime configuration
//!
//! The API token is injected through these structs rather than read from the
//! environment at the point of use. The CLI builds them from flags, which clap
//! fills from `FOOTBALL_API_KEY` and friends (a `.env` file is loaded first).

use std::path::PathBuf;

use thiserror::Error;

use crate::api::UPSTREAM_BASE_URL;
use crate::cache::CacheManager;

/// Path prefix the relay serves under
pub const DEFAULT_RELAY_PREFIX: &str = "/api/proxy";

/// Address the relay listens on by default
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No API token configured. Set FOOTBALL_API_KEY or pass --api-key")]
    MissingToken,

    #[error("Could not determine a cache directory. Pass --cache-dir")]
    NoCacheDir,

    #[error("Relay prefix must start with '/': {0}")]
    InvalidPrefix(String),
}

/// Client-side settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream API or relay base URL
    pub base_url: String,
    /// Sent as `X-Auth-Token` when present. Not needed when going through the relay.
    pub api_token: Option<String>,
    /// Overrides the XDG cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: UPSTREAM_BASE_URL.to_string(),
            api_token: None,
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn cache_manager(&self) -> Result<CacheManager, ConfigError> {
        match self.cache_dir {
            Some(ref dir) => Ok(CacheManager::with_dir(dir.clone())),
            None => CacheManager::new().ok_or(ConfigError::NoCacheDir),
        }
    }
}

/// Relay settings
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub upstream_base_url: String,
    pub api_token: String,
    /// Stripped from inbound paths before forwarding
    pub prefix: String,
    pub listen_addr: String,
}

impl RelayConfig {
    /// Builds a relay config; the relay is useless without a token, so one is required
    pub fn new(
        api_token: Option<String>,
        upstream_base_url: impl Into<String>,
        prefix: impl Into<String>,
        listen_addr: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let api_token = api_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let prefix = prefix.into();
        if !prefix.starts_with('/') {
            return Err(ConfigError::InvalidPrefix(prefix));
        }

        Ok(Self {
            upstream_base_url: upstream_base_url.into().trim_end_matches('/').to_string(),
            api_token,
            prefix: prefix.trim_end_matches('/').to_string(),
            listen_addr: listen_addr.into(),
        })
    }
}
