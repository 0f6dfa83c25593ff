//! Cache module for storing API responses locally
//!
//! This module provides a read-through cache that persists API responses with the
//! time they were fetched. Each read checks the stored timestamp against a
//! per-call TTL; expired entries are refetched but never proactively deleted.

mod key;
mod manager;
mod store;

pub use key::{CacheKey, Category, KEY_PREFIX};
pub use manager::{CacheEntry, CacheError, CacheManager, Clock, ManualClock, SystemClock};
pub use store::{FileStore, KeyValueStore, MemoryStore};
