//! FIFO eviction: victim is always the oldest still-resident key, regardless
//! of access pattern.

use std::collections::VecDeque;

use super::EvictionPolicy;

/// Evicts entries in insertion order.
pub struct FifoPolicy<K> {
    queue: VecDeque<K>,
}

impl<K> FifoPolicy<K> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<K> Default for FifoPolicy<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EvictionPolicy<K> for FifoPolicy<K>
where
    K: Clone + Eq + std::hash::Hash + Send,
{
    fn on_add(&mut self, key: &K) {
        self.queue.push_back(key.clone());
    }

    fn on_update(&mut self, _key: &K) {
        // insertion order is unaffected by updates
    }

    fn on_access(&mut self, _key: &K) {
        // FIFO doesn't care about access patterns
    }

    fn on_delete(&mut self, key: &K) {
        if let Some(pos) = self.queue.iter().position(|k| k == key) {
            self.queue.remove(pos);
        }
    }

    fn select_eviction_key(&self) -> Option<K> {
        self.queue.front().cloned()
    }

    fn reset(&mut self) {
        self.queue.clear();
    }

    fn name(&self) -> &'static str {
        "fifo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_in_insertion_order() {
        let mut policy = FifoPolicy::new();
        policy.on_add(&"a");
        policy.on_add(&"b");
        policy.on_add(&"c");
        assert_eq!(policy.select_eviction_key(), Some("a"));
    }

    #[test]
    fn access_does_not_reorder() {
        let mut policy = FifoPolicy::new();
        policy.on_add(&"a");
        policy.on_add(&"b");
        policy.on_access(&"a");
        policy.on_access(&"a");
        assert_eq!(policy.select_eviction_key(), Some("a"));
    }

    #[test]
    fn delete_removes_from_queue() {
        let mut policy = FifoPolicy::new();
        policy.on_add(&"a");
        policy.on_add(&"b");
        policy.on_delete(&"a");
        assert_eq!(policy.select_eviction_key(), Some("b"));
    }

    #[test]
    fn empty_selects_none() {
        let policy: FifoPolicy<&str> = FifoPolicy::new();
        assert_eq!(policy.select_eviction_key(), None);
    }
}
