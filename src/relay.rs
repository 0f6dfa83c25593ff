//! HTTP relay for the football data API
//!
//! Forwards requests under a path prefix to the upstream API, adding the secret
//! token so callers never hold it.
//!
//! # Behavior
//!
//! - `<prefix>/<rest>` is forwarded to `<upstream>/<rest>` with the same method,
//!   query string and body, plus `X-Auth-Token`
//! - Upstream status and JSON body are passed back verbatim, errors included,
//!   along with `Retry-After` when the upstream sends one
//! - Transport failures and non-JSON upstream bodies become a 500 with
//!   `{"error": "Failed to fetch from API"}`
//! - Every response carries permissive CORS headers; `OPTIONS` is answered
//!   directly with an empty 200
//!
//! There is no retry, timeout, or rate limiting.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, RETRY_AFTER,
        },
        HeaderValue, Method, Request, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::AUTH_HEADER;
use crate::config::RelayConfig;

/// Largest inbound body the relay will buffer
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Body sent when the upstream can't be reached or returns garbage
const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to fetch from API";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream returned a non-JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bind error: {0}")]
    Bind(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

struct RelayState {
    config: RelayConfig,
    http_client: Client,
}

/// The relay server
pub struct Relay {
    state: Arc<RelayState>,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            state: Arc::new(RelayState {
                config,
                http_client: Client::new(),
            }),
        }
    }

    /// Builds the router; every path goes through the forwarding handler
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(forward)
            .layer(middleware::from_fn(cors))
            .with_state(self.state.clone())
    }

    /// Runs the relay on the configured address until the process exits
    pub async fn run(self) -> Result<(), RelayError> {
        let addr = self.state.config.listen_addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| RelayError::Bind(format!("{}: {}", addr, e)))?;

        info!(
            addr = %addr,
            prefix = %self.state.config.prefix,
            upstream = %self.state.config.upstream_base_url,
            "Relay listening"
        );

        axum::serve(listener, self.router())
            .await
            .map_err(RelayError::Io)
    }
}

/// Adds CORS headers to every response and answers preflight requests
async fn cors(request: Request<Body>, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

/// Returns what follows `prefix` in `path_and_query`, if it is under the prefix
fn strip_prefix<'a>(prefix: &str, path_and_query: &'a str) -> Option<&'a str> {
    let rest = path_and_query.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
        Some(rest)
    } else {
        None
    }
}

async fn forward(State(state): State<Arc<RelayState>>, request: Request<Body>) -> Response {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let Some(rest) = strip_prefix(&state.config.prefix, &path_and_query) else {
        return error_response(StatusCode::NOT_FOUND, "Not found");
    };

    let url = format!("{}{}", state.config.upstream_base_url, rest);
    let method = request.method().clone();
    info!(method = %method, url = %url, "Relaying request");

    let result = match axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE).await {
        Ok(body) => relay_upstream(&state, method, &url, body).await,
        Err(e) => Err(RelayError::RequestBody(e.to_string())),
    };

    match result {
        Ok(relayed) => relayed.into_response(),
        Err(e) => {
            warn!(url = %url, error = %e, "Relay failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILURE_MESSAGE)
        }
    }
}

/// What comes back from the upstream and is passed on to the caller
struct Relayed {
    status: StatusCode,
    retry_after: Option<HeaderValue>,
    body: Value,
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(retry_after) = self.retry_after {
            response.headers_mut().insert(RETRY_AFTER, retry_after);
        }
        response
    }
}

async fn relay_upstream(
    state: &RelayState,
    method: Method,
    url: &str,
    body: Bytes,
) -> Result<Relayed, RelayError> {
    let mut request = state
        .http_client
        .request(method, url)
        .header(AUTH_HEADER, &state.config.api_token)
        .header(CONTENT_TYPE, "application/json");
    if !body.is_empty() {
        request = request.body(body);
    }

    let response = request.send().await?;
    let status = response.status();
    let retry_after = response.headers().get(RETRY_AFTER).cloned();
    let bytes = response.bytes().await?;
    Ok(Relayed {
        status,
        retry_after,
        body: serde_json::from_slice(&bytes)?,
    })
}
