//! Eviction policy capability: observes every mutation/access and picks a
//! victim when the store exceeds capacity.

mod fifo;
mod lfu;
mod lru;

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;

/// Strategy for choosing which key to evict when the store is over capacity.
///
/// All methods are called exclusively under the store's lock. Policy
/// bookkeeping (linked lists, frequency maps) is owned by the policy
/// instance, not the store; the store only announces key lifecycle events.
pub trait EvictionPolicy<K>: Send
where
    K: Clone + Eq + std::hash::Hash,
{
    /// `key` was just inserted for the first time in its current residency.
    fn on_add(&mut self, key: &K);
    /// `key`'s value was replaced in place (not a delete+add).
    fn on_update(&mut self, key: &K);
    /// `key` was successfully read.
    fn on_access(&mut self, key: &K);
    /// `key` is about to disappear (eviction, expiry, delete, clear).
    fn on_delete(&mut self, key: &K);
    /// Choose a victim among currently-tracked keys.
    ///
    /// Precondition: at least one key has been announced via `on_add` and
    /// not yet removed via `on_delete`. Postcondition: the returned key is
    /// still tracked.
    fn select_eviction_key(&self) -> Option<K>;
    /// Drop all bookkeeping, as on `clear()`/`load_from_disk()`.
    fn reset(&mut self);
    /// The name this policy is registered under.
    fn name(&self) -> &'static str;
}

/// Construct a built-in policy by its registered name.
pub fn build_builtin<K>(name: &str) -> Option<Box<dyn EvictionPolicy<K>>>
where
    K: Clone + Eq + std::hash::Hash + Send + 'static,
{
    match name {
        "lru" => Some(Box::new(LruPolicy::new())),
        "lfu" => Some(Box::new(LfuPolicy::new())),
        "fifo" => Some(Box::new(FifoPolicy::new())),
        _ => None,
    }
}
