//! In-process, thread-safe key-value cache with bounded capacity, per-entry
//! TTL, pluggable eviction policy, pluggable serialization, operation
//! metrics, and optional disk persistence.
//!
//! ```
//! use ember_cache::{Cache, CacheConfig, Ttl};
//!
//! let cache: Cache<String, String> = Cache::new(CacheConfig::new(100)).unwrap();
//! cache.set("k".to_string(), "v".to_string(), Ttl::Never).unwrap();
//! assert_eq!(cache.get(&"k".to_string()).unwrap(), "v");
//! cache.stop();
//! ```

mod config;
mod entry;
mod error;
mod metrics;
mod persistence;
mod policy;
mod registry;
mod serializer;
mod store;

pub use config::CacheConfig;
pub use entry::Ttl;
pub use error::{CacheError, CacheResult};
pub use metrics::MetricsSnapshot;
pub use policy::EvictionPolicy;
pub use registry::{get_eviction_policy, get_serializer, register_eviction_policy, register_serializer};
pub use serializer::{BinarySerializer, JsonSerializer, Serializer};
pub use store::Cache;
