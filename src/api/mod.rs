//! REST API client module for football-data.org.
//!
//! This module provides the `FootballClient` for fetching matches, match
//! detail, standings and scorer rankings, and the `FootballApi` trait the
//! dashboard is written against.
//!
//! The API authenticates with a static token sent in the `X-Auth-Token`
//! header. When requests go through the relay, the relay adds it instead.

pub mod client;
pub mod error;

pub use client::{FootballApi, FootballClient, AUTH_HEADER, UPSTREAM_BASE_URL};
pub use error::ApiError;
