//! Cache configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration accepted at cache construction time.
///
/// Callers override only the fields they care about via struct-update
/// syntax: `CacheConfig { max_size: 100, ..Default::default() }`. Every
/// other field takes the documented default below.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Positive upper bound on resident entries. Required; no default.
    pub max_size: usize,
    /// Default TTL applied when a `set`/`add`/`update` omits one.
    pub default_ttl: Option<Duration>,
    /// Interval between background cleanup sweeps.
    pub cleanup_interval: Duration,
    /// Registered eviction policy name.
    pub eviction_policy: String,
    /// Registered serializer name used for the cache snapshot.
    pub serializer: String,
    /// Directory snapshots are written to / read from by default.
    pub storage_dir: PathBuf,
    /// Base filename (without extension) for cache snapshots.
    pub filename: String,
    /// Append an ISO-8601-like timestamp to the cache snapshot filename.
    pub cache_timestamps: bool,
    /// Whether operation counters are tracked at all.
    pub enable_metrics: bool,
    /// Registered serializer name used for the metrics snapshot.
    pub metrics_serializer: String,
    /// Directory metrics snapshots are written to / read from by default.
    pub metrics_storage_dir: PathBuf,
    /// Base filename (without extension) for metrics snapshots.
    pub metrics_filename: String,
    /// Append an ISO-8601-like timestamp to the metrics snapshot filename.
    pub cache_metrics_timestamps: bool,
}

impl CacheConfig {
    /// A config with every field at its documented default except the
    /// required `max_size`.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 128,
            default_ttl: None,
            cleanup_interval: Duration::from_secs(10),
            eviction_policy: "lru".to_string(),
            serializer: "json".to_string(),
            storage_dir: PathBuf::from("."),
            filename: "cache".to_string(),
            cache_timestamps: false,
            enable_metrics: true,
            metrics_serializer: "json".to_string(),
            metrics_storage_dir: PathBuf::from("."),
            metrics_filename: "cache_metrics".to_string(),
            cache_metrics_timestamps: false,
        }
    }
}
