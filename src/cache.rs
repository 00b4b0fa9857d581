//! Generic memoizing cache with TTL expiry and LRU capacity eviction.
//!
//! A [`Cache`] maps keys to values, remembers when each entry was inserted and
//! drops it once its time-to-live has elapsed. The number of live entries is
//! bounded; the least recently used entry goes first when the bound is hit.
//!
//! [`Cache::get_or_load`] runs a loader on a miss and stores its outcome. A
//! loader reporting "absent" (`Ok(None)`) is cached as a negative entry so the
//! backing store is not asked again until the entry expires. Loader errors are
//! returned untouched and nothing is cached for them.
//!
//! Each cache has exactly one lock guarding the check-load-store sequence, so at
//! most one load per cache is in flight at a time.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use fathom::cache::Cache;
//!
//! let cache: Cache<String, u32> = Cache::new("answers", 16, Duration::ZERO);
//! let value = cache
//!     .get_or_load("life".to_string(), || Ok(Some(42)))
//!     .unwrap();
//! assert_eq!(value, Some(42));
//! assert_eq!(cache.get(&"life".to_string()), Some(42));
//! ```

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sizing and expiry settings shared by the caches of a deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries per cache instance.
    pub capacity: usize,
    /// Time-to-live in seconds; 0 disables expiry.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            capacity: 1000,
            ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    /// The configured time-to-live as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

struct CacheEntry<V> {
    /// `None` marks a negative entry.
    value: Option<V>,
    inserted: Instant,
}

/// A named, capacity-bounded cache with optional per-entry expiry.
pub struct Cache<K, V> {
    name: String,
    ttl: Duration,
    capacity: NonZeroUsize,
    entries: Mutex<LruCache<K, CacheEntry<V>>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    load_count: AtomicU64,
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one. A zero `ttl` disables expiry.
    pub fn new<S: Into<String>>(name: S, capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Cache {
            name: name.into(),
            ttl,
            capacity,
            entries: Mutex::new(LruCache::new(capacity)),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            load_count: AtomicU64::new(0),
        }
    }

    /// Create a cache from shared settings.
    pub fn with_config<S: Into<String>>(name: S, config: &CacheConfig) -> Self {
        Self::new(name, config.capacity, config.ttl())
    }

    /// Name of this cache instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        !self.ttl.is_zero() && now.duration_since(entry.inserted) >= self.ttl
    }

    /// Look up a cached entry, expiring it if its TTL has passed.
    ///
    /// The outer `Option` tells whether an entry exists; the inner one is `None`
    /// for negative entries.
    fn lookup(&self, entries: &mut LruCache<K, CacheEntry<V>>, key: &K) -> Option<Option<V>> {
        let now = Instant::now();
        let expired = match entries.get(key) {
            Some(entry) if !self.is_expired(entry, now) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Get a present value. Negative and expired entries read as `None`.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        self.lookup(&mut entries, key).flatten()
    }

    /// Whether a live entry (present or negative) exists for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        let mut entries = self.entries.lock();
        self.lookup(&mut entries, key).is_some()
    }

    /// Insert or replace a value.
    pub fn put(&self, key: K, value: V) {
        self.store(key, Some(value));
    }

    /// Record that `key` has no value.
    pub fn put_absent(&self, key: K) {
        self.store(key, None);
    }

    fn store(&self, key: K, value: Option<V>) {
        let mut entries = self.entries.lock();
        entries.put(
            key,
            CacheEntry {
                value,
                inserted: Instant::now(),
            },
        );
    }

    /// Return the cached value for `key`, loading it on a miss.
    ///
    /// The lock is held for the whole check-load-store sequence, so concurrent
    /// callers never run the loader for the same cache at the same time.
    pub fn get_or_load<F>(&self, key: K, loader: F) -> Result<Option<V>>
    where
        F: FnOnce() -> Result<Option<V>>,
    {
        let mut entries = self.entries.lock();
        if let Some(cached) = self.lookup(&mut entries, &key) {
            return Ok(cached);
        }

        self.load_count.fetch_add(1, Ordering::Relaxed);
        let loaded = loader()?;
        if loaded.is_none() {
            log::debug!("cache {}: caching negative entry", self.name);
        }
        entries.put(
            key,
            CacheEntry {
                value: loaded.clone(),
                inserted: Instant::now(),
            },
        );
        Ok(loaded)
    }

    /// Drop a single entry.
    pub fn invalidate(&self, key: &K) {
        self.entries.lock().pop(key);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries currently held, expired ones included until touched.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit, miss and load counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            load_count: self.load_count.load(Ordering::Relaxed),
            size: self.len(),
            capacity: self.capacity.get(),
        }
    }
}

/// Counters describing a cache's effectiveness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
    pub load_count: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Something whose cached state can be discarded wholesale.
pub trait Flushable: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Discard all cached entries.
    fn flush(&self);
}

impl<K, V> Flushable for Cache<K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn flush(&self) {
        self.clear();
    }
}

/// The set of caches created for one platform instance.
///
/// The registry is constructed explicitly and passed to whoever creates caches;
/// [`CacheRegistry::flush_all`] clears every registered cache.
#[derive(Default)]
pub struct CacheRegistry {
    caches: Mutex<Vec<Arc<dyn Flushable>>>,
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cache so it takes part in [`flush_all`](Self::flush_all).
    pub fn register(&self, cache: Arc<dyn Flushable>) {
        self.caches.lock().push(cache);
    }

    /// Names of the registered caches, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.caches
            .lock()
            .iter()
            .map(|cache| cache.name().to_string())
            .collect()
    }

    /// Clear every registered cache.
    pub fn flush_all(&self) {
        let caches = self.caches.lock();
        for cache in caches.iter() {
            cache.flush();
        }
        log::info!("flushed {} caches", caches.len());
    }
}
