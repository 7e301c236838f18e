//! Thread-safe cache store shared by in-flight requests

use super::fifo::FifoCache;
use super::key::CacheKey;
use super::traits::Cache;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Bounded, time-limited store of fetch results
///
/// One mutex guards the map and the insertion-order list together, so a
/// reader never observes a half-finished eviction. Every operation is
/// total: absence is a normal outcome of [`get`](Self::get), never an error.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use trendgate_core::cache::{CacheKey, CacheStore};
///
/// let store = CacheStore::new(Duration::from_secs(3600), 300);
/// store.set(CacheKey::new("hvac", "US"), vec!["ac repair"]);
/// assert!(store.get(&CacheKey::new("HVAC", "us")).is_some());
/// ```
pub struct CacheStore<V> {
    max_items: usize,
    inner: Mutex<FifoCache<CacheKey, V>>,
}

impl<V: Clone> CacheStore<V> {
    /// Create a store; `ttl == 0` or `max_items == 0` disable caching
    pub fn new(ttl: Duration, max_items: usize) -> Self {
        Self { max_items, inner: Mutex::new(FifoCache::new(max_items, ttl)) }
    }

    /// Poisoning only means another thread panicked mid-operation; every
    /// mutation leaves the list and map consistent, so keep going.
    fn lock(&self) -> MutexGuard<'_, FifoCache<CacheKey, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the live value for `key`, dropping it if it has expired
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// Insert or replace `key` as the newest entry, evicting the oldest
    /// inserted entries until the size bound holds
    pub fn set(&self, key: CacheKey, value: V) {
        self.lock().insert(key, value);
    }

    /// Number of entries currently held, expired-but-unread ones included
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop all expired entries now instead of waiting for a read
    pub fn purge_expired(&self) -> usize {
        self.lock().purge_expired()
    }

    pub fn ttl(&self) -> Duration {
        self.lock().ttl()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }
}
