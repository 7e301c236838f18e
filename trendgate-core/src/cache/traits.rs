//! Core traits for caching functionality

use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// A cache entry with metadata
///
/// Entries are never mutated after creation; replacing a value creates a new
/// entry with a fresh insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When this entry was inserted
    pub inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Create a new cache entry stamped with the current time
    pub fn new(value: V) -> Self {
        Self { value, inserted_at: Instant::now() }
    }

    /// Time elapsed since insertion
    pub fn age(&self) -> Duration {
        self.inserted_at.elapsed()
    }

    /// Check if this entry is expired
    ///
    /// A zero TTL expires every entry immediately.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        ttl.is_zero() || self.age() > ttl
    }
}

/// Core caching trait
pub trait Cache<K, V>
where
    K: Hash + Eq,
{
    /// Get a live value from the cache
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Insert a value into the cache, returning the value it replaced
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Remove a value from the cache
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Clear all entries from the cache
    fn clear(&mut self);

    /// Get the number of entries in the cache
    fn len(&self) -> usize;

    /// Check if the cache is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the capacity of the cache
    fn capacity(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expiry() {
        let entry = CacheEntry::new("v");
        assert!(!entry.is_expired(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!entry.is_expired(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(entry.is_expired(Duration::from_secs(10)));
    }

    #[test]
    fn test_zero_ttl_always_expired() {
        let entry = CacheEntry::new(1);
        assert!(entry.is_expired(Duration::ZERO));
    }
}
