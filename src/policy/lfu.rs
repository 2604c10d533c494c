//! LFU eviction: victim is the key with the fewest recorded accesses, ties
//! broken by least-recent access.
//!
//! Keys are ordered by `(frequency, recency_tick)` in a `BTreeMap`, so the
//! minimum entry is always both the least-frequently and, among ties, the
//! least-recently used key.

use std::collections::{BTreeMap, HashMap};

use super::EvictionPolicy;

pub struct LfuPolicy<K> {
    order: BTreeMap<(u64, u64), K>,
    position: HashMap<K, (u64, u64)>,
    clock: u64,
}

impl<K> LfuPolicy<K> {
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            position: HashMap::new(),
            clock: 0,
        }
    }

    fn bump(&mut self, key: &K)
    where
        K: Clone + Eq + std::hash::Hash,
    {
        let (freq, _) = self
            .position
            .get(key)
            .copied()
            .unwrap_or((0, 0));
        if let Some(old_pos) = self.position.get(key) {
            self.order.remove(old_pos);
        }
        let tick = self.clock;
        self.clock += 1;
        let new_pos = (freq + 1, tick);
        self.order.insert(new_pos, key.clone());
        self.position.insert(key.clone(), new_pos);
    }
}

impl<K> Default for LfuPolicy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EvictionPolicy<K> for LfuPolicy<K>
where
    K: Clone + Eq + std::hash::Hash + Send,
{
    fn on_add(&mut self, key: &K) {
        // starts at frequency 0 so the first bump lands it at frequency 1
        self.bump(key);
    }

    fn on_update(&mut self, key: &K) {
        self.bump(key);
    }

    fn on_access(&mut self, key: &K) {
        self.bump(key);
    }

    fn on_delete(&mut self, key: &K) {
        if let Some(pos) = self.position.remove(key) {
            self.order.remove(&pos);
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
        "lfu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_lowest_frequency() {
        let mut policy = LfuPolicy::new();
        policy.on_add(&"a");
        policy.on_add(&"b");
        policy.on_add(&"c");
        policy.on_access(&"a");
        policy.on_access(&"b");
        // c still at frequency 1, a and b at frequency 2
        assert_eq!(policy.select_eviction_key(), Some("c"));
    }

    #[test]
    fn ties_break_to_least_recently_accessed() {
        let mut policy = LfuPolicy::new();
        policy.on_add(&"a");
        policy.on_add(&"b");
        // both at frequency 1; a was touched first, so a is the victim
        assert_eq!(policy.select_eviction_key(), Some("a"));
    }

    #[test]
    fn delete_removes_candidate() {
        let mut policy = LfuPolicy::new();
        policy.on_add(&"a");
        policy.on_add(&"b");
        policy.on_delete(&"a");
        assert_eq!(policy.select_eviction_key(), Some("b"));
    }
}
