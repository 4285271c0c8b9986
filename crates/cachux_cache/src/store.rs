use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::entry::CacheEntry;
use crate::key::CacheKey;
use crate::policy::CachePolicy;

/// Result of [`MemoryCacheStore::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(Bytes),
    Miss,
    /// The entry existed but had outlived its max-age; it has been removed.
    Expired,
}

impl CacheLookup {
    pub fn into_hit(self) -> Option<Bytes> {
        match self {
            CacheLookup::Hit(bytes) => Some(bytes),
            CacheLookup::Miss | CacheLookup::Expired => None,
        }
    }
}

/// Point-in-time view of the store. Counters are cumulative.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub capacity: usize,
    pub entries: usize,
    pub valid_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub insertions: u64,
    /// Capacity evictions only; expiry removals are counted in `expired`.
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    expired: u64,
    insertions: u64,
    evictions: u64,
}

struct StoreInner {
    /// Key map and recency list in one structure, so they cannot disagree.
    entries: LruCache<CacheKey, CacheEntry>,
    counters: Counters,
}

/// Bounded response cache: LRU on capacity, TTL checked lazily on lookup.
///
/// Every operation holds the one mutex for its whole duration.
pub struct MemoryCacheStore {
    inner: Mutex<StoreInner>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryCacheStore {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self::with_clock(capacity, default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(CachePolicy::DEFAULT_CAPACITY);
        let default_ttl = if default_ttl.is_zero() {
            CachePolicy::default_ttl()
        } else {
            default_ttl
        };

        Self {
            inner: Mutex::new(StoreInner {
                entries: LruCache::new(capacity),
                counters: Counters::default(),
            }),
            default_ttl,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lookup(&self, key: &CacheKey) -> CacheLookup {
        let now = self.clock.now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let validity = inner.entries.peek(key).map(|entry| entry.is_valid_at(now));
        let outcome = match validity {
            // `get` promotes to most-recently-used.
            Some(true) => match inner.entries.get(key) {
                Some(entry) => CacheLookup::Hit(entry.response.clone()),
                None => CacheLookup::Miss,
            },
            Some(false) => {
                inner.entries.pop(key);
                CacheLookup::Expired
            }
            None => CacheLookup::Miss,
        };

        match &outcome {
            CacheLookup::Hit(bytes) => {
                inner.counters.hits += 1;
                debug!(target: "cachux::cache", cache_key = %key, bytes = bytes.len(), "Cache HIT");
            }
            CacheLookup::Expired => {
                inner.counters.expired += 1;
                inner.counters.misses += 1;
                debug!(target: "cachux::cache", cache_key = %key, "Cache EXPIRED");
            }
            CacheLookup::Miss => {
                inner.counters.misses += 1;
                debug!(target: "cachux::cache", cache_key = %key, "Cache MISS");
            }
        }

        outcome
    }

    /// Stores `response` as the most recent entry, evicting the least recently
    /// used one if the store is over capacity. A repeated key replaces the old
    /// entry outright.
    pub fn insert(&self, key: CacheKey, response: Bytes, declared_max_age: i64) {
        let max_age = CachePolicy::effective_max_age(declared_max_age, self.default_ttl);
        let entry = CacheEntry {
            response,
            inserted_at: self.clock.now(),
            max_age,
        };

        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.counters.insertions += 1;

        let inserted = key.clone();
        if let Some((evicted, _)) = inner.entries.push(key, entry) {
            if evicted != inserted {
                inner.counters.evictions += 1;
                info!(target: "cachux::cache", cache_key = %evicted, "Evicted LRU cache entry");
            }
        }

        debug!(
            target: "cachux::cache",
            cache_key = %inserted,
            ttl_secs = max_age.as_secs(),
            "Cached response"
        );
    }

    /// Read-only: no promotion, no expiry removal.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let guard = self.lock();

        CacheStats {
            capacity: guard.entries.cap().get(),
            entries: guard.entries.len(),
            valid_entries: guard
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_valid_at(now))
                .count(),
            hits: guard.counters.hits,
            misses: guard.counters.misses,
            expired: guard.counters.expired,
            insertions: guard.counters.insertions,
            evictions: guard.counters.evictions,
        }
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<CacheKey> {
        self.lock().entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().entries.contains(key)
    }
}
