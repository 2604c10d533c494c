//! Crate-root error type.

use thiserror::Error;

/// Result alias used throughout the public API.
pub type CacheResult<T> = Result<T, CacheError>;

/// The full exception taxonomy a cache operation can raise.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("key expired: {key}")]
    KeyExpired { key: String },

    #[error("key already exists: {key}")]
    KeyAlreadyExists { key: String },

    #[error("invalid ttl: {reason}")]
    InvalidTtl { reason: String },

    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CacheError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::KeyNotFound { .. })
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, CacheError::KeyExpired { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, CacheError::KeyAlreadyExists { .. })
    }
}
