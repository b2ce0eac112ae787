//! # Timed Cache
//!
//! A process-wide expiring key-value store used by the geo gateway to
//! avoid redundant network calls for cascading dropdown data.
//!
//! ## Expiry Model
//!
//! Eviction is lazy: an entry past its ttl is removed the next time it is
//! read (or during an explicit [`TimedCache::cleanup`] sweep). `keys()`
//! and `len()` may therefore report expired-but-unswept entries; this is
//! acceptable because the key space is bounded by the cardinality of the
//! underlying geo dataset (one key per country / state).
//!
//! ## Sharing
//!
//! All state sits behind a single `parking_lot::Mutex`, so one
//! `Arc<TimedCache<_>>` can be read and written from any concurrent
//! fetch. Contention is low — the lock is held only for map operations,
//! never across I/O.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A single cache slot: the payload plus its creation time and lifetime.
/// Owned exclusively by the cache; values leave only as clones.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

/// An expiring key-value store with per-entry ttl and lazy eviction.
#[derive(Debug)]
pub struct TimedCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
}

/// Default entry lifetime when the caller does not override it.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

impl<V: Clone> TimedCache<V> {
    /// Create a cache whose entries live for `default_ttl` unless a
    /// per-entry override is given via [`TimedCache::set_with_ttl`].
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Store a value under `key` with the cache's default ttl.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store a value under `key` with an explicit ttl.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Return the value stored under `key` if it is still within its ttl.
    ///
    /// An expired entry is evicted on the spot and reported as absent, so
    /// a hit always has remaining lifetime.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Remove the entry under `key`. Returns whether an entry was present
    /// (expired or not).
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// All stored keys, including expired ones not yet swept.
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Proactively remove every currently-expired entry.
    ///
    /// Never required for correctness — lazy eviction on read is
    /// sufficient — but bounds memory growth for keys no longer read.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries.lock().retain(|_, entry| !entry.is_expired(now));
    }
}

impl<V: Clone> Default for TimedCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
