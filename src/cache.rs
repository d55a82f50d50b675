use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

// Caller-owned memoization for pure computations: bounded by entry count and
// entry age, owned outside the analysis functions so they stay stateless.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    max_entries: usize,
    max_age: Duration,
    entries: HashMap<K, CacheEntry<V>>,
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    pub fn new(max_entries: usize, max_age: Duration) -> Self {
        Self {
            max_entries,
            max_age,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.inserted_at.elapsed() > self.max_age);
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn set(&mut self, key: K, value: V) {
        if self.max_entries == 0 {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn evict(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn evict_expired(&mut self) {
        let max_age = self.max_age;
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() <= max_age);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::BoundedCache;

    #[test]
    fn get_returns_what_set_stored() {
        let mut cache = BoundedCache::new(4, Duration::from_secs(60));
        cache.set("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn capacity_eviction_drops_the_oldest_entry() {
        let mut cache = BoundedCache::new(2, Duration::from_secs(60));
        cache.set("a", 1);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("b", 2);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn overwriting_a_key_does_not_evict_siblings() {
        let mut cache = BoundedCache::new(2, Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("b", 20);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), Some(20));
    }

    #[test]
    fn expired_entries_are_dropped_on_access() {
        let mut cache = BoundedCache::new(4, Duration::ZERO);
        cache.set("a", 1);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn explicit_evict_reports_whether_the_key_existed() {
        let mut cache = BoundedCache::new(4, Duration::from_secs(60));
        cache.set("a", 1);
        assert!(cache.evict(&"a"));
        assert!(!cache.evict(&"a"));
    }

    #[test]
    fn evict_expired_sweeps_stale_entries() {
        let mut cache = BoundedCache::new(4, Duration::ZERO);
        cache.set("a", 1);
        cache.set("b", 2);
        std::thread::sleep(Duration::from_millis(2));
        cache.evict_expired();
        assert!(cache.is_empty());
    }
}
