use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// A bounded LRU cache: the recency queue always ends with the most
/// recently used key, and inserting past capacity drops the front.
#[derive(Debug)]
pub struct LruCache<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Create a new cache limited to `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Retrieve a value from the cache, updating its recency.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let value = self.map.get(key).cloned()?;
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
        Some(value)
    }

    /// Insert a value, evicting the least recently used entry first when
    /// the cache is full.
    pub fn put(&mut self, key: K, value: V) {
        if self.map.contains_key(&key) {
            self.map.insert(key.clone(), value);
            if let Some(pos) = self.order.iter().position(|k| k == &key) {
                self.order.remove(pos);
            }
            self.order.push_back(key);
            return;
        }

        while self.map.len() >= self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
        self.map.insert(key.clone(), value);
        self.order.push_back(key);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all cached entries.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::LruCache;

    #[test]
    fn size_never_exceeds_capacity() {
        let mut cache = LruCache::new(3);
        for i in 0..10 {
            cache.put(i, i * 10);
            assert!(cache.len() <= 3);
        }
    }

    #[test]
    fn eviction_targets_least_recently_accessed_not_first_inserted() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        // touch "a" so "b" becomes the LRU entry
        assert_eq!(cache.get(&"a"), Some(1));
        cache.put("c", 3);

        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn reinsert_updates_value_and_recency() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 9);
        cache.put("c", 3);

        assert_eq!(cache.get(&"a"), Some(9));
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut cache = LruCache::new(0);
        cache.put(1, "x");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), Some("x"));
    }
}
