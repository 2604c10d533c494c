//! The stored record under one key, and the time-to-live it carries.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Current time as milliseconds since the Unix epoch.
///
/// Absolute, not monotonic: persisted entries must compare meaningfully
/// across process restarts, which a `std::time::Instant` cannot do.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Time-to-live for a `set`/`add`/`update` call.
///
/// Three states, matching §4.1's TTL resolution rule: fall back to the
/// cache's configured default, never expire, or expire after a given
/// duration.
#[derive(Debug, Clone, Copy, Default)]
pub enum Ttl {
    /// Use the cache's `default_ttl`.
    #[default]
    Default,
    /// The entry never expires, regardless of `default_ttl`.
    Never,
    /// Expire after this duration from now.
    After(Duration),
}

impl Ttl {
    /// Resolve to an absolute `expires_at` in epoch millis, given `now` and
    /// the cache's configured default TTL (also a duration, or none).
    pub(crate) fn resolve(
        self,
        now: i64,
        default_ttl: Option<Duration>,
    ) -> Result<Option<i64>, CacheError> {
        let duration = match self {
            Ttl::Never => return Ok(None),
            Ttl::Default => default_ttl,
            Ttl::After(d) => Some(d),
        };
        match duration {
            None => Ok(None),
            Some(d) if d.is_zero() => Err(CacheError::InvalidTtl {
                reason: "ttl must be greater than zero".into(),
            }),
            Some(d) => Ok(Some(now + d.as_millis() as i64)),
        }
    }
}

/// The stored record under one key plus its access metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: i64,
    pub expires_at: Option<i64>,
    pub access_count: u64,
    pub last_access: i64,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, expires_at: Option<i64>, now: i64) -> Self {
        Self {
            value,
            created_at: now,
            expires_at,
            access_count: 1,
            last_access: now,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Record a successful read: bump the access count and recency.
    pub fn touch(&mut self, now: i64) {
        self.access_count += 1;
        self.last_access = now;
    }

    /// Replace the value on an upsert, refreshing creation/recency and TTL.
    pub fn refresh(&mut self, value: V, expires_at: Option<i64>, now: i64) {
        self.value = value;
        self.created_at = now;
        self.last_access = now;
        self.access_count += 1;
        self.expires_at = expires_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_is_inclusive() {
        let entry = CacheEntry::new(1, Some(1000), 0);
        assert!(!entry.is_expired(999));
        assert!(entry.is_expired(1000));
        assert!(entry.is_expired(1001));
    }

    #[test]
    fn never_expires_without_ttl() {
        let entry = CacheEntry::new(1, None, 0);
        assert!(!entry.is_expired(i64::MAX));
    }

    #[test]
    fn zero_ttl_is_invalid() {
        let err = Ttl::After(Duration::ZERO).resolve(0, None).unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl { .. }));
    }

    #[test]
    fn never_overrides_default() {
        let resolved = Ttl::Never.resolve(0, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn default_falls_back_to_configured_ttl() {
        let resolved = Ttl::Default
            .resolve(1_000, Some(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(resolved, Some(2_000));
    }
}
