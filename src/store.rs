//! The insertion-ordered store, the cleanup worker, and the public cache
//! handle that ties registry, policy, metrics, and persistence together.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use indexmap::IndexMap;
use parking_lot::{Condvar, Mutex, ReentrantMutex};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::CacheConfig;
use crate::entry::{now_millis, CacheEntry, Ttl};
use crate::error::{CacheError, CacheResult};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::persistence::{self, CacheSnapshot, MetricsDoc, SnapshotEntry, SNAPSHOT_VERSION};
use crate::policy::EvictionPolicy;
use crate::registry;
use crate::serializer::Serializer;

struct State<K, V> {
    entries: IndexMap<K, CacheEntry<V>>,
    policy: Box<dyn EvictionPolicy<K>>,
}

struct Shared<K, V> {
    lock: ReentrantMutex<RefCell<State<K, V>>>,
    config: CacheConfig,
    metrics: Metrics,
    serializer: Box<dyn Serializer>,
    metrics_serializer: Box<dyn Serializer>,
    shutdown: AtomicBool,
    wake: Condvar,
    wake_lock: Mutex<()>,
}

impl<K, V> Shared<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    fn get(&self, key: &K) -> CacheResult<V> {
        let guard = self.lock.lock();
        let mut state = guard.borrow_mut();
        let now = now_millis();
        let expired = state.entries.get(key).map(|e| e.is_expired(now));
        match expired {
            None => {
                drop(state);
                self.metrics.record_miss();
                tracing::trace!(?key, "cache miss");
                Err(CacheError::KeyNotFound {
                    key: format!("{key:?}"),
                })
            }
            Some(true) => {
                state.entries.shift_remove(key);
                state.policy.on_delete(key);
                drop(state);
                self.metrics.record_expired_hit();
                tracing::debug!(?key, "read of expired key");
                Err(CacheError::KeyExpired {
                    key: format!("{key:?}"),
                })
            }
            Some(false) => {
                let entry = state.entries.get_mut(key).expect("checked present above");
                entry.touch(now);
                let value = entry.value.clone();
                state.policy.on_access(key);
                drop(state);
                self.metrics.record_hit();
                Ok(value)
            }
        }
    }

    fn set(&self, key: K, value: V, ttl: Ttl) -> CacheResult<()> {
        let now = now_millis();
        let expires_at = ttl.resolve(now, self.config.default_ttl)?;
        let guard = self.lock.lock();
        let mut state = guard.borrow_mut();
        if let Some(entry) = state.entries.get_mut(&key) {
            entry.refresh(value, expires_at, now);
            state.policy.on_update(&key);
            drop(state);
            self.metrics.record_update();
            return Ok(());
        }
        let evicted = insert_and_maybe_evict(&mut state, key, value, expires_at, now, self.config.max_size);
        drop(state);
        if evicted {
            self.metrics.record_eviction();
        }
        self.metrics.record_set();
        Ok(())
    }

    fn add(&self, key: K, value: V, ttl: Ttl) -> CacheResult<()> {
        let now = now_millis();
        let expires_at = ttl.resolve(now, self.config.default_ttl)?;
        let guard = self.lock.lock();
        let mut state = guard.borrow_mut();
        if let Some(entry) = state.entries.get(&key) {
            if !entry.is_expired(now) {
                return Err(CacheError::KeyAlreadyExists {
                    key: format!("{key:?}"),
                });
            }
            // present but expired: drop the stale entry silently, no metric
            state.entries.shift_remove(&key);
            state.policy.on_delete(&key);
        }
        let evicted = insert_and_maybe_evict(&mut state, key, value, expires_at, now, self.config.max_size);
        drop(state);
        if evicted {
            self.metrics.record_eviction();
        }
        self.metrics.record_add();
        Ok(())
    }

    fn update(&self, key: K, value: V, ttl: Ttl) -> CacheResult<()> {
        let now = now_millis();
        let expires_at = ttl.resolve(now, self.config.default_ttl)?;
        let guard = self.lock.lock();
        let mut state = guard.borrow_mut();
        let expired = state.entries.get(&key).map(|e| e.is_expired(now));
        match expired {
            None => Err(CacheError::KeyNotFound {
                key: format!("{key:?}"),
            }),
            Some(true) => {
                state.entries.shift_remove(&key);
                state.policy.on_delete(&key);
                Err(CacheError::KeyNotFound {
                    key: format!("{key:?}"),
                })
            }
            Some(false) => {
                let entry = state.entries.get_mut(&key).expect("checked present above");
                entry.refresh(value, expires_at, now);
                state.policy.on_update(&key);
                drop(state);
                self.metrics.record_update();
                Ok(())
            }
        }
    }

    fn delete(&self, key: &K) -> CacheResult<()> {
        let guard = self.lock.lock();
        let mut state = guard.borrow_mut();
        if state.entries.shift_remove(key).is_none() {
            return Err(CacheError::KeyNotFound {
                key: format!("{key:?}"),
            });
        }
        state.policy.on_delete(key);
        drop(state);
        self.metrics.record_delete();
        Ok(())
    }

    fn set_many(&self, items: Vec<(K, V)>, ttl: Ttl) -> CacheResult<()> {
        let now = now_millis();
        let expires_at = ttl.resolve(now, self.config.default_ttl)?;
        let guard = self.lock.lock();
        for (key, value) in items {
            let mut state = guard.borrow_mut();
            if let Some(entry) = state.entries.get_mut(&key) {
                entry.refresh(value, expires_at, now);
                state.policy.on_update(&key);
                drop(state);
                self.metrics.record_update();
                continue;
            }
            let evicted =
                insert_and_maybe_evict(&mut state, key, value, expires_at, now, self.config.max_size);
            drop(state);
            if evicted {
                self.metrics.record_eviction();
            }
            self.metrics.record_set();
        }
        Ok(())
    }

    fn get_many(&self, keys: Vec<K>) -> HashMap<K, V> {
        let guard = self.lock.lock();
        let mut out = HashMap::new();
        for key in keys {
            let mut state = guard.borrow_mut();
            let now = now_millis();
            let expired = state.entries.get(&key).map(|e| e.is_expired(now));
            match expired {
                None => {
                    drop(state);
                    self.metrics.record_miss();
                }
                Some(true) => {
                    state.entries.shift_remove(&key);
                    state.policy.on_delete(&key);
                    drop(state);
                    self.metrics.record_expired_hit();
                }
                Some(false) => {
                    let entry = state.entries.get_mut(&key).expect("checked present above");
                    entry.touch(now);
                    let value = entry.value.clone();
                    state.policy.on_access(&key);
                    drop(state);
                    self.metrics.record_hit();
                    out.insert(key, value);
                }
            }
        }
        out
    }

    fn delete_many(&self, keys: Vec<K>) {
        let guard = self.lock.lock();
        for key in keys {
            let mut state = guard.borrow_mut();
            if state.entries.shift_remove(&key).is_some() {
                state.policy.on_delete(&key);
                drop(state);
                self.metrics.record_delete();
            }
        }
    }

    fn size(&self) -> usize {
        let guard = self.lock.lock();
        guard.borrow().entries.len()
    }

    fn valid_size(&self) -> usize {
        let guard = self.lock.lock();
        let state = guard.borrow();
        let now = now_millis();
        state.entries.values().filter(|e| !e.is_expired(now)).count()
    }

    fn clear(&self) {
        let guard = self.lock.lock();
        let mut state = guard.borrow_mut();
        state.entries.clear();
        state.policy.reset();
    }

    fn cleanup(&self) -> usize {
        let guard = self.lock.lock();
        let mut state = guard.borrow_mut();
        let now = now_millis();
        let expired: Vec<K> = state
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            state.entries.shift_remove(key);
            state.policy.on_delete(key);
        }
        let removed = expired.len();
        drop(state);
        self.metrics.record_cleanup(removed);
        if removed > 0 {
            tracing::debug!(removed, "cleanup pass removed expired entries");
        }
        removed
    }

    fn resolve_cache_path(&self, explicit: Option<&Path>) -> PathBuf {
        persistence::resolve_path(
            explicit,
            &self.config.storage_dir,
            &self.config.filename,
            self.config.cache_timestamps,
            self.serializer.extension(),
        )
    }

    fn resolve_metrics_path(&self, explicit: Option<&Path>) -> PathBuf {
        persistence::resolve_path(
            explicit,
            &self.config.metrics_storage_dir,
            &self.config.metrics_filename,
            self.config.cache_metrics_timestamps,
            self.metrics_serializer.extension(),
        )
    }
}

impl<K, V> Shared<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Serialize + DeserializeOwned + 'static,
    V: Clone + Send + Serialize + DeserializeOwned + 'static,
{
    fn save_to_disk(&self, filepath: Option<&Path>) -> CacheResult<PathBuf> {
        // Held for the whole operation: the single reentrant acquisition
        // below spans the nested `self.cleanup()` call (which re-enters the
        // same lock on this thread) and the snapshot read that follows, so
        // no other thread can interleave a mutation between cleanup and
        // save.
        let guard = self.lock.lock();
        self.cleanup();
        let state = guard.borrow();
        let entries = state
            .entries
            .iter()
            .map(|(k, e)| SnapshotEntry::from_parts(k.clone(), e.clone()))
            .collect();
        drop(state);
        let doc = CacheSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: now_millis(),
            default_ttl_millis: self.config.default_ttl.map(|d| d.as_millis() as i64),
            entries,
        };
        drop(guard);
        let path = self.resolve_cache_path(filepath);
        let bytes = persistence::encode(self.serializer.as_ref(), &doc)?;
        persistence::write_atomic(&path, &bytes)?;
        Ok(path)
    }

    fn load_from_disk(&self, filepath: Option<&Path>) -> CacheResult<()> {
        let path = self.resolve_cache_path(filepath);
        let bytes = std::fs::read(&path).map_err(|e| CacheError::Persistence(e.to_string()))?;
        let doc: CacheSnapshot<K, V> = persistence::decode(self.serializer.as_ref(), &bytes)?;
        if doc.entries.len() > self.config.max_size {
            return Err(CacheError::Persistence(format!(
                "snapshot has {} entries, exceeding capacity {}",
                doc.entries.len(),
                self.config.max_size
            )));
        }
        let now = now_millis();
        let guard = self.lock.lock();
        let mut state = guard.borrow_mut();
        state.entries.clear();
        state.policy.reset();
        let mut dropped_expired = 0usize;
        for snapshot_entry in doc.entries {
            let (key, entry) = snapshot_entry.into_parts();
            if entry.is_expired(now) {
                dropped_expired += 1;
                continue;
            }
            state.entries.insert(key.clone(), entry);
            state.policy.on_add(&key);
        }
        drop(state);
        if dropped_expired > 0 {
            tracing::warn!(dropped_expired, "load_from_disk dropped expired entries");
        }
        Ok(())
    }

    fn save_metrics_to_disk(&self, filepath: Option<&Path>) -> CacheResult<PathBuf> {
        let doc = MetricsDoc {
            version: SNAPSHOT_VERSION,
            snapshot: self.metrics.snapshot(),
        };
        let path = self.resolve_metrics_path(filepath);
        let bytes = persistence::encode(self.metrics_serializer.as_ref(), &doc)?;
        persistence::write_atomic(&path, &bytes)?;
        Ok(path)
    }
}

/// Insert a new key and, if this pushes the store over capacity, evict
/// exactly one victim chosen from the keys that existed before this insert.
///
/// The victim is selected *before* the new key is announced to the policy,
/// from the pre-insert key set alone, so the just-inserted key is never a
/// candidate — this is what the spec's insert-then-evict ordering rule
/// requires. Selecting after `on_add` would let a policy whose ordering
/// isn't recency-only (LFU: frequency dominates, and a brand-new key starts
/// at the lowest frequency) pick the new key itself as the victim.
fn insert_and_maybe_evict<K, V>(
    state: &mut State<K, V>,
    key: K,
    value: V,
    expires_at: Option<i64>,
    now: i64,
    max_size: usize,
) -> bool
where
    K: Clone + Eq + Hash,
{
    let victim = if state.entries.len() >= max_size {
        state.policy.select_eviction_key()
    } else {
        None
    };
    state.entries.insert(key.clone(), CacheEntry::new(value, expires_at, now));
    state.policy.on_add(&key);
    match victim {
        Some(victim) => {
            state.entries.shift_remove(&victim);
            state.policy.on_delete(&victim);
            true
        }
        None => false,
    }
}

/// A background worker that periodically sweeps expired entries.
struct Worker {
    handle: Option<JoinHandle<()>>,
}

/// In-process, thread-safe, bounded-capacity key-value cache.
pub struct Cache<K, V> {
    shared: Arc<Shared<K, V>>,
    worker: Mutex<Worker>,
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Build a cache from `config`, resolving its eviction policy and
    /// serializer names through the registry and starting the background
    /// cleanup worker.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        if config.max_size == 0 {
            return Err(CacheError::Configuration(
                "max_size must be positive".to_string(),
            ));
        }
        let policy = registry::get_eviction_policy::<K>(&config.eviction_policy)?;
        let serializer = registry::get_serializer(&config.serializer)?;
        let metrics_serializer = registry::get_serializer(&config.metrics_serializer)?;
        let enable_metrics = config.enable_metrics;
        let shared = Arc::new(Shared {
            lock: ReentrantMutex::new(RefCell::new(State {
                entries: IndexMap::new(),
                policy,
            })),
            config,
            metrics: Metrics::new(enable_metrics),
            serializer,
            metrics_serializer,
            shutdown: AtomicBool::new(false),
            wake: Condvar::new(),
            wake_lock: Mutex::new(()),
        });
        let handle = spawn_worker(Arc::clone(&shared));
        Ok(Self {
            shared,
            worker: Mutex::new(Worker {
                handle: Some(handle),
            }),
        })
    }

    pub fn get(&self, key: &K) -> CacheResult<V> {
        self.shared.get(key)
    }

    pub fn set(&self, key: K, value: V, ttl: Ttl) -> CacheResult<()> {
        self.shared.set(key, value, ttl)
    }

    pub fn add(&self, key: K, value: V, ttl: Ttl) -> CacheResult<()> {
        self.shared.add(key, value, ttl)
    }

    pub fn update(&self, key: K, value: V, ttl: Ttl) -> CacheResult<()> {
        self.shared.update(key, value, ttl)
    }

    pub fn delete(&self, key: &K) -> CacheResult<()> {
        self.shared.delete(key)
    }

    pub fn set_many(&self, items: impl IntoIterator<Item = (K, V)>, ttl: Ttl) -> CacheResult<()> {
        self.shared.set_many(items.into_iter().collect(), ttl)
    }

    pub fn get_many(&self, keys: impl IntoIterator<Item = K>) -> HashMap<K, V> {
        self.shared.get_many(keys.into_iter().collect())
    }

    pub fn delete_many(&self, keys: impl IntoIterator<Item = K>) {
        self.shared.delete_many(keys.into_iter().collect())
    }

    pub fn size(&self) -> usize {
        self.shared.size()
    }

    pub fn valid_size(&self) -> usize {
        self.shared.valid_size()
    }

    pub fn clear(&self) {
        self.shared.clear()
    }

    pub fn cleanup(&self) -> usize {
        self.shared.cleanup()
    }

    // Reads the atomic counters directly rather than taking `self.shared.lock`:
    // each counter is independently atomic and consistent with the mutation it
    // describes, at the cost of a snapshot that isn't a single point-in-time
    // view across all counters under concurrent writers.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.shared.metrics.reset()
    }

    /// Signal the cleanup worker to stop and join it. Idempotent, bounded
    /// by at most one `cleanup_interval`.
    pub fn stop(&self) {
        let mut worker = self.worker.lock();
        if let Some(handle) = worker.handle.take() {
            self.shared.shutdown.store(true, Ordering::Release);
            self.shared.wake.notify_all();
            let _ = handle.join();
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Serialize + DeserializeOwned + 'static,
    V: Clone + Send + Serialize + DeserializeOwned + 'static,
{
    pub fn save_to_disk(&self, filepath: Option<&Path>) -> CacheResult<PathBuf> {
        self.shared.save_to_disk(filepath)
    }

    pub fn load_from_disk(&self, filepath: Option<&Path>) -> CacheResult<()> {
        self.shared.load_from_disk(filepath)
    }

    pub fn save_metrics_to_disk(&self, filepath: Option<&Path>) -> CacheResult<PathBuf> {
        self.shared.save_metrics_to_disk(filepath)
    }
}

impl<K, V> Drop for Cache<K, V> {
    fn drop(&mut self) {
        // Defensive: a cache dropped without an explicit `stop()` call must
        // still join its worker rather than leak the thread.
        let mut worker = self.worker.lock();
        if let Some(handle) = worker.handle.take() {
            self.shared.shutdown.store(true, Ordering::Release);
            self.shared.wake.notify_all();
            let _ = handle.join();
        }
    }
}

fn spawn_worker<K, V>(shared: Arc<Shared<K, V>>) -> JoinHandle<()>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    std::thread::Builder::new()
        .name("ember-cache-cleanup".to_string())
        .spawn(move || loop {
            let interval = shared.config.cleanup_interval;
            let mut guard = shared.wake_lock.lock();
            let result = shared.wake.wait_for(&mut guard, interval);
            drop(guard);
            if shared.shutdown.load(Ordering::Acquire) {
                break;
            }
            if !result.timed_out() {
                // woken explicitly with no shutdown requested: re-wait
                continue;
            }
            // bounded attempt: on contention, skip this tick rather than block
            match shared.lock.try_lock() {
                Some(probe) => drop(probe),
                None => {
                    tracing::warn!("cleanup tick skipped: cache busy");
                    continue;
                }
            }
            shared.cleanup();
        })
        .expect("failed to spawn cleanup worker thread")
}
