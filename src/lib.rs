//! matchboard library
//!
//! A football-data.org client with a read-through file cache, the dashboard
//! service built on it, and the relay that injects the API token.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod relay;
pub mod report;
pub mod selection;

#[cfg(test)]
mod testing;
