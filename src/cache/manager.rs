//! Read-through cache over a persistent key-value store
//!
//! Provides a `CacheManager` that stores serialized API responses together with
//! the time they were fetched, and serves them back while they are younger than
//! a caller-supplied TTL.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::key::CacheKey;
use super::store::{FileStore, KeyValueStore};

/// Errors from cache maintenance operations
///
/// Lookups never return these; a read that fails is treated as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Source of the current time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to. Useful for testing expiry.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A value as it sits in storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached data
    pub data: T,
    /// When the data was fetched, in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    /// Milliseconds since the entry was stored, or `None` if that doesn't fit in an i64
    pub fn age_millis(&self, now_millis: i64) -> Option<i64> {
        now_millis.checked_sub(self.timestamp)
    }

    /// An entry is fresh while its age is strictly below the TTL
    ///
    /// An age that can't be computed counts as expired.
    pub fn is_fresh(&self, now_millis: i64, ttl: Duration) -> bool {
        self.age_millis(now_millis)
            .is_some_and(|age| age < duration_millis(ttl))
    }
}

fn duration_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

type InflightSlots = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// Read-through cache shared by every cache-eligible fetch
///
/// Entries are never evicted on expiry. A stale entry stays in storage until it
/// is overwritten by a successful fetch or removed by [`CacheManager::clear_all`].
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    inflight: InflightSlots,
}

impl CacheManager {
    /// Creates a CacheManager backed by files in the XDG cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined.
    pub fn new() -> Option<Self> {
        FileStore::new().map(|store| Self::with_store(Arc::new(store)))
    }

    /// Creates a CacheManager backed by files in a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self::with_store(Arc::new(FileStore::with_dir(cache_dir)))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            inflight: Arc::default(),
        }
    }

    /// Replaces the clock used for timestamps and expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reads the raw entry under `key`
    ///
    /// Returns `None` if nothing is stored, the store fails, or the stored value
    /// doesn't parse. Failures are logged, never returned.
    pub fn read_entry<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        let raw = match self.store.get(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "No cache entry");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %key, error = %e, "Cache entry is corrupt, treating as a miss");
                None
            }
        }
    }

    /// Returns the cached data under `key` if it is younger than `ttl`
    pub fn read<T: DeserializeOwned>(&self, key: &CacheKey, ttl: Duration) -> Option<T> {
        let entry = self.read_entry::<T>(key)?;
        let now = self.clock.now_millis();
        let age_secs = entry.age_millis(now).map(|age| age / 1000);

        if entry.is_fresh(now, ttl) {
            debug!(key = %key, age_secs, "Using cached data");
            Some(entry.data)
        } else {
            debug!(key = %key, age_secs, "Cache entry expired");
            None
        }
    }

    /// Stores `data` under `key`, stamped with the current time
    pub fn write<T: Serialize>(&self, key: &CacheKey, data: &T) -> Result<(), CacheError> {
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now_millis(),
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set(key.as_str(), &json)?;
        debug!(key = %key, "Cached data");
        Ok(())
    }

    /// Returns fresh cached data for `key`, or runs `fetcher` and caches its result
    ///
    /// A failed fetch is returned as-is and leaves storage untouched. Concurrent
    /// calls for the same key share one fetch: later callers wait for the first
    /// and then read what it stored.
    pub async fn fetch_with_cache<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        fetcher: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(data) = self.read(key, ttl) {
            return Ok(data);
        }

        let slot = self.inflight_slot(key);
        let result = {
            let _in_flight = slot.lock().await;
            self.fetch_locked(key, ttl, fetcher).await
        };
        self.release_slot(key, slot);
        result
    }

    async fn fetch_locked<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        fetcher: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Another caller may have filled the entry while we waited
        if let Some(data) = self.read(key, ttl) {
            return Ok(data);
        }

        let data = fetcher().await?;
        if let Err(e) = self.write(key, &data) {
            warn!(key = %key, error = %e, "Failed to save to cache");
        }
        Ok(data)
    }

    fn inflight_slot(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut slots = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.as_str().to_string()).or_default().clone()
    }

    fn release_slot(&self, key: &CacheKey, slot: Arc<tokio::sync::Mutex<()>>) {
        let mut slots = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one here: nobody else is waiting
        if Arc::strong_count(&slot) <= 2 {
            slots.remove(key.as_str());
        }
    }

    /// Deletes every entry in the `football_` namespace
    ///
    /// Returns the number of entries removed. Keys owned by anything else are left alone.
    pub fn clear_all(&self) -> Result<usize, CacheError> {
        let keys: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter(|key| CacheKey::is_owned(key))
            .collect();

        for key in &keys {
            self.store.remove(key)?;
        }

        info!(removed = keys.len(), "Cleared cache entries");
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    const TTL: Duration = Duration::from_secs(5 * 60);
    const T0: i64 = 1_714_521_600_000;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn test_data(name: &str, value: i32) -> TestData {
        TestData {
            name: name.to_string(),
            value,
        }
    }

    fn create_test_cache() -> (CacheManager, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let cache = CacheManager::with_store(store.clone()).with_clock(clock.clone());
        (cache, store, clock)
    }

    fn key() -> CacheKey {
        CacheKey::standings("PL")
    }

    #[tokio::test]
    async fn test_fresh_entry_is_returned_without_fetching() {
        let (cache, _store, clock) = create_test_cache();
        cache.write(&key(), &test_data("cached", 1)).unwrap();
        clock.advance(TTL - Duration::from_millis(1));

        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<TestData, String> = cache
            .fetch_with_cache(&key(), TTL, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(test_data("fetched", 2))
            })
            .await;

        assert_eq!(result.unwrap(), test_data("cached", 1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_fetches_once_and_restamps_after_fetch() {
        let (cache, _store, clock) = create_test_cache();
        cache.write(&key(), &test_data("old", 1)).unwrap();
        clock.advance(TTL);
        let latency_clock = clock.clone();

        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<TestData, String> = cache
            .fetch_with_cache(&key(), TTL, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                // Simulated network latency
                latency_clock.advance(Duration::from_millis(750));
                Ok(test_data("new", 2))
            })
            .await;

        assert_eq!(result.unwrap(), test_data("new", 2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let entry: CacheEntry<TestData> = cache.read_entry(&key()).unwrap();
        assert_eq!(entry.data, test_data("new", 2));
        assert_eq!(entry.timestamp, T0 + duration_millis(TTL) + 750);
    }

    #[tokio::test]
    async fn test_missing_entry_fetches_and_stores() {
        let (cache, store, _clock) = create_test_cache();

        let result: Result<TestData, String> = cache
            .fetch_with_cache(&key(), TTL, || async { Ok(test_data("fetched", 7)) })
            .await;

        assert_eq!(result.unwrap(), test_data("fetched", 7));
        let raw = store.get("football_standings_PL").unwrap().unwrap();
        assert!(raw.contains("\"timestamp\""));
        assert!(raw.contains("\"fetched\""));
    }

    #[tokio::test]
    async fn test_failed_fetch_propagates_and_keeps_stale_entry() {
        let (cache, store, clock) = create_test_cache();
        cache.write(&key(), &test_data("stale", 1)).unwrap();
        let before = store.get(key().as_str()).unwrap();
        clock.advance(TTL * 2);

        let result: Result<TestData, String> = cache
            .fetch_with_cache(&key(), TTL, || async { Err("429 wait 30 seconds".to_string()) })
            .await;

        assert_eq!(result.unwrap_err(), "429 wait 30 seconds");
        assert_eq!(store.get(key().as_str()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_failed_fetch_writes_nothing() {
        let (cache, store, _clock) = create_test_cache();

        let result: Result<TestData, String> = cache
            .fetch_with_cache(&key(), TTL, || async { Err("boom".to_string()) })
            .await;

        assert!(result.is_err());
        assert!(store.keys().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss_and_gets_overwritten() {
        let (cache, store, _clock) = create_test_cache();
        store.set(key().as_str(), "{not json").unwrap();

        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<TestData, String> = cache
            .fetch_with_cache(&key(), TTL, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(test_data("repaired", 3))
            })
            .await;

        assert_eq!(result.unwrap(), test_data("repaired", 3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let entry: CacheEntry<TestData> = cache.read_entry(&key()).unwrap();
        assert_eq!(entry.data, test_data("repaired", 3));
    }

    #[tokio::test]
    async fn test_out_of_range_timestamp_is_a_miss() {
        let (cache, store, _clock) = create_test_cache();
        store
            .set(key().as_str(), r#"{"data":1,"timestamp":-9223372036854775808}"#)
            .unwrap();

        let result: Result<i32, String> = cache
            .fetch_with_cache(&key(), TTL, || async { Ok(2) })
            .await;

        assert_eq!(result.unwrap(), 2);
        let entry: CacheEntry<i32> = cache.read_entry(&key()).unwrap();
        assert_eq!(entry.timestamp, T0);
    }

    #[test]
    fn test_age_overflow_counts_as_expired() {
        let entry = CacheEntry {
            data: (),
            timestamp: i64::MIN,
        };
        assert_eq!(entry.age_millis(T0), None);
        assert!(!entry.is_fresh(T0, TTL));
        assert!(!entry.is_fresh(i64::MAX, Duration::MAX));
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let (cache, _store, _clock) = create_test_cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>(test_data("shared", 9))
        };

        let key = key();
        let (a, b) = tokio::join!(
            cache.fetch_with_cache(&key, TTL, fetch),
            cache.fetch_with_cache(&key, TTL, fetch),
        );

        assert_eq!(a.unwrap(), test_data("shared", 9));
        assert_eq!(b.unwrap(), test_data("shared", 9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.inflight.lock().unwrap().is_empty());
    }

    #[test]
    fn test_read_treats_age_equal_to_ttl_as_expired() {
        let (cache, _store, clock) = create_test_cache();
        cache.write(&key(), &test_data("x", 1)).unwrap();

        clock.advance(TTL - Duration::from_millis(1));
        assert!(cache.read::<TestData>(&key(), TTL).is_some());

        clock.advance(Duration::from_millis(1));
        assert!(cache.read::<TestData>(&key(), TTL).is_none());
    }

    #[test]
    fn test_expired_entry_is_not_deleted_on_read() {
        let (cache, store, clock) = create_test_cache();
        cache.write(&key(), &test_data("x", 1)).unwrap();
        clock.advance(TTL * 3);

        assert!(cache.read::<TestData>(&key(), TTL).is_none());
        assert!(store.get(key().as_str()).unwrap().is_some());
    }

    #[test]
    fn test_cache_entry_survives_serialization_roundtrip() {
        let entry = CacheEntry {
            data: vec![test_data("a", 1), test_data("b", 2)],
            timestamp: T0,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: CacheEntry<Vec<TestData>> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_clear_all_removes_only_owned_keys() {
        let (cache, store, _clock) = create_test_cache();
        store.set("football_matches_PL_2024-05-01", "{}").unwrap();
        store.set("football_standings_PL", "{}").unwrap();
        store.set("other_app_setting", "dark").unwrap();

        let removed = cache.clear_all().unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.keys().unwrap(), vec!["other_app_setting"]);
    }

    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> io::Result<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
        fn remove(&self, key: &str) -> io::Result<()> {
            self.0.remove(key)
        }
        fn keys(&self) -> io::Result<Vec<String>> {
            self.0.keys()
        }
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_fetched_data() {
        let cache = CacheManager::with_store(Arc::new(ReadOnlyStore(MemoryStore::new())));

        let result: Result<TestData, String> = cache
            .fetch_with_cache(&key(), TTL, || async { Ok(test_data("unsaved", 4)) })
            .await;

        assert_eq!(result.unwrap(), test_data("unsaved", 4));
    }

    #[tokio::test]
    async fn test_file_backed_cache_writes_json_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());

        let result: Result<TestData, String> = cache
            .fetch_with_cache(&CacheKey::detail(42), TTL, || async {
                Ok(test_data("detail", 42))
            })
            .await;

        assert!(result.is_ok());
        assert!(temp_dir.path().join("football_detail_42.json").exists());
    }
}
