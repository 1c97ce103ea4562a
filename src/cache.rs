//! Time-bounded cache for live query results.
//!
//! Entries are never invalidated explicitly: a result is served until it is
//! older than the freshness window of its query kind, then refetched. The
//! number of entries is bounded; the least recently used one makes room.
//! Draft reads never reach this module.
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::CacheSettings;
use crate::locale::Locale;

fn default_capacity() -> NonZeroUsize {
    NonZeroUsize::new(1024).expect("non-zero cache size")
}

/// How often the underlying content changes, which decides how stale a
/// cached answer may get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Frequently changing lists (latest posts, home page blocks).
    Listing,
    /// A single document page.
    Detail,
    Search,
    /// Near-static vocabularies (countries, categories).
    Taxonomy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub listing: Duration,
    pub detail: Duration,
    pub search: Duration,
    pub taxonomy: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}

impl FreshnessPolicy {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            listing: Duration::from_secs(settings.listing_secs),
            detail: Duration::from_secs(settings.detail_secs),
            search: Duration::from_secs(settings.search_secs),
            taxonomy: Duration::from_secs(settings.taxonomy_secs),
        }
    }

    pub fn max_age(&self, kind: QueryKind) -> Duration {
        match kind {
            QueryKind::Listing => self.listing,
            QueryKind::Detail => self.detail,
            QueryKind::Search => self.search,
            QueryKind::Taxonomy => self.taxonomy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub identity: String,
    pub locale: Locale,
    pub preview: bool,
}

struct CachedResult {
    value: Value,
    expires_at: Instant,
}

/// Bounded LRU of live results. Each entry carries the deadline of the
/// freshness window it was stored under; stale entries are dropped on read
/// and swept before every insert.
pub struct QueryCache {
    entries: Mutex<LruCache<CacheKey, CachedResult>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_capacity(default_capacity())
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::with_capacity(NonZeroUsize::new(settings.max_entries).unwrap_or_else(default_capacity))
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<CacheKey, CachedResult>> {
        // A panic while holding the guard cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.entries().cap().get()
    }

    /// Cached value for `key` if its freshness window has not closed.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut entries = self.entries();
        let fresh = entries.get(key)?.expires_at > Instant::now();
        if fresh {
            entries.peek(key).map(|entry| entry.value.clone())
        } else {
            entries.pop(key);
            None
        }
    }

    /// Store `value` for `max_age`. When full, the least recently used entry
    /// is evicted.
    pub fn insert(&self, key: CacheKey, value: Value, max_age: Duration) {
        let now = Instant::now();
        let mut entries = self.entries();
        purge_expired(&mut entries, now);
        entries.put(
            key,
            CachedResult {
                value,
                expires_at: now + max_age,
            },
        );
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let mut entries = self.entries();
        purge_expired(&mut entries, Instant::now());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn purge_expired(entries: &mut LruCache<CacheKey, CachedResult>, now: Instant) {
    let stale: Vec<CacheKey> = entries
        .iter()
        .filter(|(_, entry)| entry.expires_at <= now)
        .map(|(key, _)| key.clone())
        .collect();
    for key in stale {
        entries.pop(&key);
    }
}
