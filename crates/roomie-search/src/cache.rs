//! Bounded, time-boxed cache of search result pages.
//!
//! Entries are fresh while `now - fetched_at < ttl`. Stale entries are not
//! evicted eagerly; lookups skip them and a later insert overwrites them.
//! Capacity is enforced least-recently-used. The whole cache mirrors to a
//! [`CacheStore`] under two documents: the page mapping and the timestamp
//! mapping.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tracing::{debug, warn};

use roomie_core::config::CacheConfig;
use roomie_core::error::AppError;
use roomie_core::result::AppResult;
use roomie_core::traits::CacheStore;
use roomie_core::types::ProfileSummary;

use crate::keys::{SEARCH_CACHE, SEARCH_CACHE_TIMESTAMPS};

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now_millis(&self) -> i64;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self(AtomicI64::new(start_millis))
    }

    pub fn advance(&self, by: Duration) {
        self.0.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct CachedPage {
    posts: Vec<ProfileSummary>,
    fetched_at: i64,
}

/// Cache occupancy summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Stored entries, fresh or not.
    pub entries: usize,
    /// Entries still inside the freshness window.
    pub fresh: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

/// LRU page cache with a freshness window.
#[derive(Debug)]
pub struct PageCache {
    entries: LruCache<String, CachedPage>,
    ttl_millis: i64,
    clock: Arc<dyn Clock>,
}

impl PageCache {
    /// Create an empty cache. A zero capacity is treated as one.
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl_millis: ttl.as_millis() as i64,
            clock,
        }
    }

    /// Create an empty cache from configuration using the system clock.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            config.capacity,
            Duration::from_secs(config.ttl_seconds),
            Arc::new(SystemClock),
        )
    }

    fn is_fresh(&self, page: &CachedPage, now: i64) -> bool {
        now - page.fetched_at < self.ttl_millis
    }

    /// Fresh page for `key`, marking it recently used.
    pub fn get(&mut self, key: &str) -> Option<Vec<ProfileSummary>> {
        let now = self.clock.now_millis();
        let fresh = self.entries.peek(key).map(|p| self.is_fresh(p, now))?;
        if !fresh {
            debug!(key, "Cache entry expired");
            return None;
        }
        self.entries.get(key).map(|p| p.posts.clone())
    }

    /// Store `posts` under `key`, stamped with the current time.
    pub fn insert(&mut self, key: String, posts: Vec<ProfileSummary>) {
        let fetched_at = self.clock.now_millis();
        if let Some((evicted, _)) = self.entries.push(key.clone(), CachedPage { posts, fetched_at }) {
            if evicted != key {
                debug!(key = %evicted, "Evicted least recently used page");
            }
        }
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            self.entries.pop(key);
        }
        doomed.len()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_millis();
        CacheStats {
            entries: self.entries.len(),
            fresh: self
                .entries
                .iter()
                .filter(|(_, p)| self.is_fresh(p, now))
                .count(),
            capacity: self.entries.cap().get(),
        }
    }

    /// Write the whole cache to `store`.
    pub async fn persist(&self, store: &dyn CacheStore) -> AppResult<()> {
        let mut pages: HashMap<&str, &Vec<ProfileSummary>> = HashMap::new();
        let mut stamps: HashMap<&str, i64> = HashMap::new();
        for (key, page) in self.entries.iter() {
            pages.insert(key, &page.posts);
            stamps.insert(key, page.fetched_at);
        }

        store.set(SEARCH_CACHE, &serde_json::to_string(&pages)?).await?;
        store
            .set(SEARCH_CACHE_TIMESTAMPS, &serde_json::to_string(&stamps)?)
            .await?;
        Ok(())
    }

    /// Replace the contents with what `store` holds.
    ///
    /// Unreadable or corrupt state is discarded as a whole: both documents
    /// are deleted and the cache starts empty. Returns the number of entries
    /// loaded.
    pub async fn load(&mut self, store: &dyn CacheStore) -> usize {
        self.entries.clear();
        match read_persisted(store).await {
            Ok(Some((mut pages, stamps))) => {
                let mut ordered: Vec<(String, i64)> = stamps
                    .into_iter()
                    .filter(|(k, _)| pages.contains_key(k))
                    .collect();
                // oldest first so the newest end up most recently used
                ordered.sort_by_key(|(_, at)| *at);
                for (key, fetched_at) in ordered {
                    if let Some(posts) = pages.remove(&key) {
                        self.entries.push(key, CachedPage { posts, fetched_at });
                    }
                }
                debug!(entries = self.entries.len(), "Loaded search cache");
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Discarding unreadable search cache");
                for key in [SEARCH_CACHE, SEARCH_CACHE_TIMESTAMPS] {
                    if let Err(e) = store.delete(key).await {
                        warn!(key, error = %e, "Failed to clear cache document");
                    }
                }
            }
        }
        self.entries.len()
    }
}

type Persisted = (HashMap<String, Vec<ProfileSummary>>, HashMap<String, i64>);

async fn read_persisted(store: &dyn CacheStore) -> AppResult<Option<Persisted>> {
    let pages = store.get(SEARCH_CACHE).await?;
    let stamps = store.get(SEARCH_CACHE_TIMESTAMPS).await?;
    match (pages, stamps) {
        (Some(pages), Some(stamps)) => Ok(Some((
            serde_json::from_str(&pages)?,
            serde_json::from_str(&stamps)?,
        ))),
        (None, None) => Ok(None),
        // one document without the other cannot be trusted
        _ => Err(AppError::cache("Incomplete persisted search cache")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn profile(id: &str) -> ProfileSummary {
        serde_json::from_value(serde_json::json!({ "_id": id, "name": id })).unwrap()
    }

    fn cache(capacity: usize) -> (PageCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let cache = PageCache::new(capacity, Duration::from_secs(300), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_fresh_hit_then_expiry() {
        let (mut cache, clock) = cache(4);
        cache.insert("k".to_string(), vec![profile("a")]);
        assert_eq!(cache.get("k").unwrap()[0].id, "a");

        clock.advance(Duration::from_secs(299));
        assert!(cache.get("k").is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get("k").is_none());
        // skipped on lookup, not evicted
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().fresh, 0);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let (mut cache, _clock) = cache(2);
        cache.insert("a".to_string(), vec![]);
        cache.insert("b".to_string(), vec![]);
        assert!(cache.get("a").is_some());
        cache.insert("c".to_string(), vec![]);

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_invalidate_prefix() {
        let (mut cache, _clock) = cache(8);
        cache.insert("f1|page=1".to_string(), vec![]);
        cache.insert("f1|page=2".to_string(), vec![]);
        cache.insert("f2|page=1".to_string(), vec![]);

        assert_eq!(cache.invalidate_prefix("f1|page="), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("f2|page=1").is_some());
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let store = MemoryStore::new();
        let (mut cache, clock) = cache(8);
        cache.insert("old".to_string(), vec![profile("x")]);
        clock.advance(Duration::from_secs(10));
        cache.insert("new".to_string(), vec![profile("y")]);
        cache.persist(&store).await.unwrap();

        let mut reloaded = PageCache::new(8, Duration::from_secs(300), clock.clone());
        assert_eq!(reloaded.load(&store).await, 2);
        assert_eq!(reloaded.get("new").unwrap()[0].id, "y");
        assert_eq!(reloaded.get("old").unwrap()[0].id, "x");
    }

    #[tokio::test]
    async fn test_reload_into_smaller_cache_keeps_newest() {
        let store = MemoryStore::new();
        let (mut cache, clock) = cache(8);
        for key in ["a", "b", "c"] {
            cache.insert(key.to_string(), vec![]);
            clock.advance(Duration::from_secs(1));
        }
        cache.persist(&store).await.unwrap();

        let mut small = PageCache::new(2, Duration::from_secs(300), clock.clone());
        assert_eq!(small.load(&store).await, 2);
        assert!(small.get("a").is_none());
        assert!(small.get("c").is_some());
    }

    #[tokio::test]
    async fn test_corrupt_state_is_discarded_entirely() {
        let store = MemoryStore::new();
        store.set(SEARCH_CACHE, "{not json").await.unwrap();
        store.set(SEARCH_CACHE_TIMESTAMPS, "{}").await.unwrap();

        let (mut cache, _clock) = cache(8);
        assert_eq!(cache.load(&store).await, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_half_persisted_state_is_discarded() {
        for key in [SEARCH_CACHE, SEARCH_CACHE_TIMESTAMPS] {
            let store = MemoryStore::new();
            store.set(key, "{}").await.unwrap();

            let (mut cache, _clock) = cache(8);
            assert_eq!(cache.load(&store).await, 0);
            assert!(store.is_empty());
        }
    }
}
