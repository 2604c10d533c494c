//! LRU eviction: victim is the key least recently inserted, accessed, or
//! updated.
//!
//! Recency is tracked with a logical clock rather than an intrusive linked
//! list: a `BTreeMap<tick, key>` orders keys by recency and a
//! `HashMap<key, tick>` gives O(log n) removal of a key's old position.
//! The victim is always the first entry of the `BTreeMap`.

use std::collections::{BTreeMap, HashMap};

use super::EvictionPolicy;

pub struct LruPolicy<K> {
    order: BTreeMap<u64, K>,
    position: HashMap<K, u64>,
    clock: u64,
}

impl<K> LruPolicy<K> {
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            position: HashMap::new(),
            clock: 0,
        }
    }

    fn touch(&mut self, key: &K)
    where
        K: Clone + Eq + std::hash::Hash,
    {
        if let Some(old_tick) = self.position.get(key) {
            self.order.remove(old_tick);
        }
        let tick = self.clock;
        self.clock += 1;
        self.order.insert(tick, key.clone());
        self.position.insert(key.clone(), tick);
    }
}

impl<K> Default for LruPolicy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EvictionPolicy<K> for LruPolicy<K>
where
    K: Clone + Eq + std::hash::Hash + Send,
{
    fn on_add(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_update(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_access(&mut self, key: &K) {
        self.touch(key);
    }

    fn on_delete(&mut self, key: &K) {
        if let Some(tick) = self.position.remove(key) {
            self.order.remove(&tick);
        }
    }

    fn select_eviction_key(&self) -> Option<K> {
        self.order.values().next().cloned()
    }

    fn reset(&mut self) {
        self.order.clear();
        self.position.clear();
        self.clock = 0;
    }

    fn name(&self) -> &'static str {
        "lru"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut policy = LruPolicy::new();
        policy.on_add(&"a");
        policy.on_add(&"b");
        policy.on_add(&"c");
        policy.on_access(&"a");
        // a was touched most recently, b is now the oldest
        assert_eq!(policy.select_eviction_key(), Some("b"));
    }

    #[test]
    fn update_refreshes_recency() {
        let mut policy = LruPolicy::new();
        policy.on_add(&"a");
        policy.on_add(&"b");
        policy.on_update(&"a");
        assert_eq!(policy.select_eviction_key(), Some("b"));
    }

    #[test]
    fn delete_removes_candidate() {
        let mut policy = LruPolicy::new();
        policy.on_add(&"a");
        policy.on_add(&"b");
        policy.on_delete(&"a");
        assert_eq!(policy.select_eviction_key(), Some("b"));
    }
}
