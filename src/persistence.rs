//! Snapshot document shape and path resolution for `save_to_disk`/
//! `load_from_disk`/`save_metrics_to_disk`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entry::CacheEntry;
use crate::error::{CacheError, CacheResult};
use crate::metrics::MetricsSnapshot;
use crate::serializer::Serializer;

/// Logical snapshot of the whole cache, per §4.5.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheSnapshot<K, V> {
    pub version: u32,
    pub saved_at: i64,
    pub default_ttl_millis: Option<i64>,
    pub entries: Vec<SnapshotEntry<K, V>>,
}

// Fields are inlined rather than embedding `CacheEntry<V>` via
// `#[serde(flatten)]`: flatten's deserialize implementation requires a
// self-describing format and breaks under `bincode`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotEntry<K, V> {
    pub key: K,
    pub value: V,
    pub created_at: i64,
    pub expires_at: Option<i64>,
    pub access_count: u64,
    pub last_access: i64,
}

impl<K, V> SnapshotEntry<K, V> {
    pub fn from_parts(key: K, entry: CacheEntry<V>) -> Self {
        Self {
            key,
            value: entry.value,
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            access_count: entry.access_count,
            last_access: entry.last_access,
        }
    }

    pub fn into_parts(self) -> (K, CacheEntry<V>) {
        (
            self.key,
            CacheEntry {
                value: self.value,
                created_at: self.created_at,
                expires_at: self.expires_at,
                access_count: self.access_count,
                last_access: self.last_access,
            },
        )
    }
}

pub const SNAPSHOT_VERSION: u32 = 1;

/// ISO-8601-like, filesystem-safe, seconds-resolution timestamp suffix.
pub fn timestamp_suffix() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Compose `storage_dir / filename[.timestamp].extension`, or return the
/// caller-supplied path unchanged.
pub fn resolve_path(
    explicit: Option<&Path>,
    storage_dir: &Path,
    filename: &str,
    use_timestamp: bool,
    extension: &str,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let mut name = filename.to_string();
    if use_timestamp {
        name.push('.');
        name.push_str(&timestamp_suffix());
    }
    name.push('.');
    name.push_str(extension);
    storage_dir.join(name)
}

/// Encode `doc` with the concrete document's own `Serialize` impl (not via
/// the value-level `Serializer::serialize_value`, see `serializer/mod.rs`).
pub fn encode<T: Serialize>(serializer: &dyn Serializer, doc: &T) -> CacheResult<Vec<u8>> {
    if serializer.is_binary() {
        bincode::serialize(doc).map_err(|e| CacheError::Serialization(e.to_string()))
    } else {
        serde_json::to_vec(doc).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

pub fn decode<T: for<'de> Deserialize<'de>>(
    serializer: &dyn Serializer,
    bytes: &[u8],
) -> CacheResult<T> {
    if serializer.is_binary() {
        bincode::deserialize(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
    } else {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

/// Write `bytes` to `path` atomically: write to a sibling temp file, then
/// rename over the target. A partial write must never replace the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> CacheResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| CacheError::Persistence(e.to_string()))?;
    let tmp_path = dir.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("snapshot")
    ));
    std::fs::write(&tmp_path, bytes).map_err(|e| CacheError::Persistence(e.to_string()))?;
    std::fs::rename(&tmp_path, path).map_err(|e| CacheError::Persistence(e.to_string()))?;
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsDoc {
    pub version: u32,
    pub snapshot: MetricsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_used_as_is() {
        let explicit = PathBuf::from("/tmp/foo.json");
        let resolved = resolve_path(Some(&explicit), Path::new("/ignored"), "cache", true, "json");
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn composed_path_without_timestamp() {
        let resolved = resolve_path(None, Path::new("/data"), "cache", false, "json");
        assert_eq!(resolved, PathBuf::from("/data/cache.json"));
    }

    #[test]
    fn composed_path_with_timestamp_has_three_dot_segments() {
        let resolved = resolve_path(None, Path::new("/data"), "cache", true, "json");
        let name = resolved.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.matches('.').count(), 2);
        assert!(name.ends_with(".json"));
    }
}
