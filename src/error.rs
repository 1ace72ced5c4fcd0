//! Error types for cache operations.

use thiserror::Error;

/// Error returned by a [`StorageBackend`](crate::StorageBackend) when a key
/// violates its constraints.
///
/// This is the only error a backend surfaces. The cache folds it locally —
/// lookups degrade to a miss and stores report `false` — so callers of
/// [`ReadThroughCache`](crate::ReadThroughCache) never see it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cache key {key:?}: {reason}")]
pub struct KeyValidationError {
    /// The offending key, verbatim.
    pub key: String,
    /// Which constraint the key violated.
    pub reason: String,
}

impl KeyValidationError {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
