//! Request coalescing
//!
//! Concurrent cache misses for the same key share one in-flight load. The
//! table only holds weak handles: once every caller waiting on a load has
//! gone away, the load itself is dropped, cancelling its provider call.

use super::error::FetchResult;
use crate::cache::CacheKey;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A load that several callers can await together
pub type SharedLoad<V> = Shared<BoxFuture<'static, FetchResult<V>>>;

type WeakLoad<V> = WeakShared<BoxFuture<'static, FetchResult<V>>>;

/// Dead handles are pruned once the table grows past this
const PRUNE_THRESHOLD: usize = 1024;

/// In-flight loads by key
pub struct InflightTable<V> {
    next_id: AtomicU64,
    loads: Mutex<HashMap<CacheKey, (u64, WeakLoad<V>)>>,
}

impl<V> Default for InflightTable<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> InflightTable<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(0), loads: Mutex::new(HashMap::new()) }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, (u64, WeakLoad<V>)>> {
        self.loads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the live load for `key`, or start one with `start`
    ///
    /// The boolean is true when this caller started the load.
    pub fn join_or_start<F>(self: &Arc<Self>, key: &CacheKey, start: F) -> (SharedLoad<V>, bool)
    where
        F: FnOnce() -> BoxFuture<'static, FetchResult<V>>,
    {
        let mut loads = self.lock();

        if let Some((_, weak)) = loads.get(key) {
            if let Some(shared) = weak.upgrade() {
                return (shared, false);
            }
        }

        if loads.len() >= PRUNE_THRESHOLD {
            loads.retain(|_, (_, weak)| weak.upgrade().is_some());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let table = Arc::clone(self);
        let owned_key = key.clone();
        let load = start();

        let shared = async move {
            let result = load.await;
            table.finish(&owned_key, id);
            result
        }
        .boxed()
        .shared();

        if let Some(weak) = shared.downgrade() {
            loads.insert(key.clone(), (id, weak));
        }

        (shared, true)
    }

    /// Forget a completed load unless a newer one already replaced it
    fn finish(&self, key: &CacheKey, id: u64) {
        let mut loads = self.lock();
        if matches!(loads.get(key), Some((current, _)) if *current == id) {
            loads.remove(key);
        }
    }

    /// Keys with a load that still has someone waiting on it
    pub fn active(&self) -> usize {
        self.lock().values().filter(|(_, weak)| weak.upgrade().is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    fn counting_load(
        calls: &Arc<AtomicU32>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, FetchResult<u32>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_joiners_share_one_load() {
        let table = Arc::new(InflightTable::new());
        let calls = Arc::new(AtomicU32::new(0));
        let key = CacheKey::new("hvac", "US");

        let (first, started_first) = table.join_or_start(&key, counting_load(&calls, 7));
        let (second, started_second) = table.join_or_start(&key, counting_load(&calls, 8));

        assert!(started_first);
        assert!(!started_second);

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, Ok(7));
        assert_eq!(b, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(table.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_load_is_not_reused() {
        let table = Arc::new(InflightTable::new());
        let calls = Arc::new(AtomicU32::new(0));
        let key = CacheKey::new("hvac", "US");

        let (first, _) = table.join_or_start(&key, counting_load(&calls, 1));
        assert_eq!(first.await, Ok(1));

        let (second, started) = table.join_or_start(&key, counting_load(&calls, 2));
        assert!(started);
        assert_eq!(second.await, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_load_is_restarted() {
        let table = Arc::new(InflightTable::new());
        let calls = Arc::new(AtomicU32::new(0));
        let key = CacheKey::new("hvac", "US");

        let (abandoned, _) = table.join_or_start(&key, counting_load(&calls, 1));
        let timed_out = tokio::time::timeout(Duration::from_millis(10), abandoned).await;
        assert!(timed_out.is_err());
        assert_eq!(table.active(), 0);

        let (fresh, started) = table.join_or_start(&key, counting_load(&calls, 2));
        assert!(started);
        assert_eq!(fresh.await, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_do_not_share() {
        let table = Arc::new(InflightTable::new());
        let calls = Arc::new(AtomicU32::new(0));

        let (a, _) = table.join_or_start(&CacheKey::new("hvac", "US"), counting_load(&calls, 1));
        let (b, _) = table.join_or_start(&CacheKey::new("hvac", "GB"), counting_load(&calls, 2));

        let (a, b) = tokio::join!(a, b);
        assert_eq!((a, b), (Ok(1), Ok(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
