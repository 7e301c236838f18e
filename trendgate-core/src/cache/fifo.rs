//! FIFO cache with lazy TTL expiry
//!
//! Uses a HashMap for lookups and a doubly-linked list (slab-allocated in a
//! Vec) for insertion order. Reads never reorder the list: the oldest
//! *inserted* entry is always the first one evicted.

use super::traits::{Cache, CacheEntry};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// Node in the insertion-order list
struct FifoNode<K, V> {
    key: K,
    entry: CacheEntry<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Insertion-ordered cache bounded by item count and entry age
///
/// Not synchronized; see [`CacheStore`](super::CacheStore) for the shared
/// version. A capacity of zero or a zero TTL are legal and disable caching.
pub struct FifoCache<K, V>
where
    K: Hash + Eq + Clone,
{
    capacity: usize,
    ttl: Duration,
    map: HashMap<K, usize>,
    nodes: Vec<Option<FifoNode<K, V>>>,
    /// Oldest inserted entry
    head: Option<usize>,
    /// Newest inserted entry
    tail: Option<usize>,
    free_list: Vec<usize>,
}

impl<K, V> FifoCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new cache holding at most `capacity` entries for at most `ttl`
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            map: HashMap::with_capacity(capacity.min(4096)),
            nodes: Vec::with_capacity(capacity.min(4096)),
            head: None,
            tail: None,
            free_list: Vec::new(),
        }
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unlink a node from the list and release its slot
    fn detach(&mut self, idx: usize) -> Option<FifoNode<K, V>> {
        let node = self.nodes[idx].take()?;

        if let Some(prev_idx) = node.prev {
            if let Some(prev_node) = &mut self.nodes[prev_idx] {
                prev_node.next = node.next;
            }
        } else {
            self.head = node.next;
        }

        if let Some(next_idx) = node.next {
            if let Some(next_node) = &mut self.nodes[next_idx] {
                next_node.prev = node.prev;
            }
        } else {
            self.tail = node.prev;
        }

        self.free_list.push(idx);
        Some(node)
    }

    /// Append a fresh entry at the newest end of the list
    fn push_back(&mut self, key: K, value: V) {
        let idx = self.get_node_index();
        let old_tail = self.tail;

        self.nodes[idx] = Some(FifoNode {
            key: key.clone(),
            entry: CacheEntry::new(value),
            prev: old_tail,
            next: None,
        });

        if let Some(old_tail_idx) = old_tail {
            if let Some(old_tail_node) = &mut self.nodes[old_tail_idx] {
                old_tail_node.next = Some(idx);
            }
        }

        self.tail = Some(idx);

        if self.head.is_none() {
            self.head = Some(idx);
        }

        self.map.insert(key, idx);
    }

    /// Remove the oldest inserted item (head)
    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let head_idx = self.head?;
        let node = self.detach(head_idx)?;
        self.map.remove(&node.key);
        Some((node.key, node.entry.value))
    }

    /// Get a node index, either from free list or by allocating new
    fn get_node_index(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }

    /// Drop every expired entry, returning how many were removed
    ///
    /// Insertion order is also timestamp order, so expired entries always
    /// form a prefix of the list.
    pub fn purge_expired(&mut self) -> usize {
        let mut removed = 0;
        while let Some(head_idx) = self.head {
            let expired = match &self.nodes[head_idx] {
                Some(node) => node.entry.is_expired(self.ttl),
                None => false,
            };
            if !expired {
                break;
            }
            self.evict_oldest();
            removed += 1;
        }
        removed
    }

    /// Keys from oldest to newest insertion
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            match &self.nodes[idx] {
                Some(node) => {
                    keys.push(node.key.clone());
                    cursor = node.next;
                }
                None => break,
            }
        }
        keys
    }
}

impl<K, V> Cache<K, V> for FifoCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;

        let expired = match &self.nodes[idx] {
            Some(node) => node.entry.is_expired(self.ttl),
            None => true,
        };

        if expired {
            self.remove(key);
            return None;
        }

        self.nodes[idx].as_ref().map(|node| &node.entry.value)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        // Re-inserting counts as a new insertion: drop the old position
        let old_value = match self.map.remove(&key) {
            Some(idx) => self.detach(idx).map(|node| node.entry.value),
            None => None,
        };

        self.push_back(key, value);

        while self.map.len() > self.capacity {
            if self.evict_oldest().is_none() {
                break;
            }
        }

        old_value
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.detach(idx).map(|node| node.entry.value)
    }

    fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_fifo_basic_operations() {
        let mut cache = FifoCache::new(2, HOUR);

        assert_eq!(cache.insert("a", 1), None);
        assert_eq!(cache.insert("b", 2), None);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut cache = FifoCache::new(2, HOUR);

        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3); // Should evict "a"

        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn test_reads_do_not_refresh_order() {
        let mut cache = FifoCache::new(2, HOUR);

        cache.insert("a", 1);
        cache.insert("b", 2);

        // An LRU would keep "a" after this read; FIFO does not
        cache.get(&"a");
        cache.insert("c", 3);

        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn test_reinsert_moves_to_newest() {
        let mut cache = FifoCache::new(2, HOUR);

        cache.insert("a", 1);
        cache.insert("b", 2);

        assert_eq!(cache.insert("a", 10), Some(1));
        assert_eq!(cache.keys(), vec!["b", "a"]);

        cache.insert("c", 3); // Should evict "b", not "a"

        assert_eq!(cache.get(&"a"), Some(&10));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn test_oldest_of_n_plus_one_is_evicted() {
        let n = 5;
        let mut cache = FifoCache::new(n, HOUR);

        for i in 0..=n {
            cache.insert(i, i * 10);
            assert!(cache.len() <= n);
        }

        assert_eq!(cache.get(&0), None);
        for i in 1..=n {
            assert_eq!(cache.get(&i), Some(&(i * 10)));
        }
    }

    #[test]
    fn test_fifo_remove_and_clear() {
        let mut cache = FifoCache::new(3, HOUR);

        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);

        assert_eq!(cache.remove(&"b"), Some(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["a", "c"]);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut cache = FifoCache::new(0, HOUR);

        cache.insert("a", 1);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_zero_ttl_reads_absent() {
        let mut cache = FifoCache::new(10, Duration::ZERO);

        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_expiry_removes_on_read() {
        let mut cache = FifoCache::new(10, Duration::from_secs(60));

        cache.insert("a", 1);
        tokio::time::advance(Duration::from_secs(30)).await;
        cache.insert("b", 2);

        tokio::time::advance(Duration::from_secs(31)).await;

        // Still counted until something reads it
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"b"), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_prefix() {
        let mut cache = FifoCache::new(10, Duration::from_secs(60));

        cache.insert("a", 1);
        cache.insert("b", 2);
        tokio::time::advance(Duration::from_secs(45)).await;
        cache.insert("c", 3);
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.keys(), vec!["c"]);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut cache = FifoCache::new(2, HOUR);

        for i in 0..100 {
            cache.insert(i, i);
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.nodes.len() <= 3);
        assert_eq!(cache.keys(), vec![98, 99]);
    }
}
