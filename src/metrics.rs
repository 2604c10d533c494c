//! Operation counters and derived hit/miss ratios.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::entry::now_millis;

/// Atomic counters, one per tracked operation, plus the cache's creation
/// timestamp. Each counter is incremented under the store lock immediately
/// after the state change it describes, unless `enabled` is false, in which
/// case every `record_*` call is a no-op and the snapshot stays all-zero.
#[derive(Debug)]
pub struct Metrics {
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    expired_hits: AtomicU64,
    sets: AtomicU64,
    adds: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
    cleanup_runs: AtomicU64,
    cleanup_removed: AtomicU64,
    created_at: AtomicI64,
}

impl Metrics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired_hits: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            adds: AtomicU64::new(0),
            updates: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            cleanup_runs: AtomicU64::new(0),
            cleanup_removed: AtomicU64::new(0),
            created_at: AtomicI64::new(now_millis()),
        }
    }

    pub fn record_hit(&self) {
        if !self.enabled {
            return;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        if !self.enabled {
            return;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired_hit(&self) {
        if !self.enabled {
            return;
        }
        self.expired_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        if !self.enabled {
            return;
        }
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_add(&self) {
        if !self.enabled {
            return;
        }
        self.adds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_update(&self) {
        if !self.enabled {
            return;
        }
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        if !self.enabled {
            return;
        }
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        if !self.enabled {
            return;
        }
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cleanup(&self, removed: usize) {
        if !self.enabled {
            return;
        }
        self.cleanup_runs.fetch_add(1, Ordering::Relaxed);
        self.cleanup_removed
            .fetch_add(removed as u64, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.expired_hits.store(0, Ordering::Relaxed);
        self.sets.store(0, Ordering::Relaxed);
        self.adds.store(0, Ordering::Relaxed);
        self.updates.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.cleanup_runs.store(0, Ordering::Relaxed);
        self.cleanup_removed.store(0, Ordering::Relaxed);
        self.created_at.store(now_millis(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let expired_hits = self.expired_hits.load(Ordering::Relaxed);
        let total_gets = hits + misses + expired_hits;
        MetricsSnapshot {
            hits,
            misses,
            expired_hits,
            sets: self.sets.load(Ordering::Relaxed),
            adds: self.adds.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            cleanup_runs: self.cleanup_runs.load(Ordering::Relaxed),
            cleanup_removed: self.cleanup_removed.load(Ordering::Relaxed),
            created_at: self.created_at.load(Ordering::Relaxed),
            hit_rate: if total_gets > 0 {
                hits as f64 / total_gets as f64
            } else {
                0.0
            },
            miss_rate: if total_gets > 0 {
                (misses + expired_hits) as f64 / total_gets as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(true)
    }
}

/// An immutable view of the counters as of one lock acquisition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub expired_hits: u64,
    pub sets: u64,
    pub adds: u64,
    pub updates: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub cleanup_runs: u64,
    pub cleanup_removed: u64,
    pub created_at: i64,
    pub hit_rate: f64,
    pub miss_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_rates_are_zero_with_no_gets() {
        let metrics = Metrics::new(true);
        let snap = metrics.snapshot();
        assert_eq!(snap.hit_rate, 0.0);
        assert_eq!(snap.miss_rate, 0.0);
    }

    #[test]
    fn hit_rate_reflects_hits_over_total_gets() {
        let metrics = Metrics::new(true);
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_expired_hit();
        let snap = metrics.snapshot();
        assert_eq!(snap.hits + snap.misses + snap.expired_hits, 4);
        assert!((snap.hit_rate - 0.5).abs() < f64::EPSILON);
        assert!((snap.miss_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn reset_zeroes_everything() {
        let metrics = Metrics::new(true);
        metrics.record_hit();
        metrics.record_eviction();
        metrics.reset();
        let snap = metrics.snapshot();
        assert_eq!(snap.hits, 0);
        assert_eq!(snap.evictions, 0);
    }

    #[test]
    fn disabled_metrics_ignore_every_record_call() {
        let metrics = Metrics::new(false);
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_set();
        metrics.record_eviction();
        metrics.record_cleanup(3);
        let snap = metrics.snapshot();
        assert_eq!(snap.hits, 0);
        assert_eq!(snap.misses, 0);
        assert_eq!(snap.sets, 0);
        assert_eq!(snap.evictions, 0);
        assert_eq!(snap.cleanup_runs, 0);
        assert_eq!(snap.cleanup_removed, 0);
    }
}
