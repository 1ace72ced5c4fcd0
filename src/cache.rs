//! The read-through cache core.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::StorageBackend;
use crate::key::CacheKey;
use crate::value::{is_empty_value, is_non_cacheable};

const DEFAULT_TTL_SECS: u64 = 300;

/// Cache-wide configuration, fixed for the lifetime of the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied whenever a call site does not pass one. Zero disables
    /// expiration entirely.
    pub default_ttl: Duration,
    /// When false, lookups miss and stores are dropped without touching the
    /// backend.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Counters describing how effective the cache has been.
///
/// `errors` counts backend key rejections the cache absorbed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Read-through cache over a pluggable [`StorageBackend`].
///
/// [`remember`](Self::remember) is the main entry point: it returns the
/// cached value when one is present and non-empty, and otherwise runs the
/// producer, stores its result, and returns it. Callers never learn whether
/// a value was cached or freshly computed, and never see backend errors —
/// a failing backend only costs recomputation and persistence, never
/// correctness.
///
/// `remember` is not atomic across its get/compute/store sequence: two
/// concurrent calls racing on the same missing key may both run the producer
/// and both write. Mutual exclusion, if needed, belongs to the backend or to
/// an external lock.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use recache::{MemoryBackend, ReadThroughCache};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let cache = ReadThroughCache::with_backend(Arc::new(MemoryBackend::new(1000)));
///
/// let report = cache
///     .remember("seo.example.com", || async {
///         Ok::<_, anyhow::Error>(json!({ "score": 87 }))
///     })
///     .await?;
/// assert_eq!(report["score"], 87);
///
/// // Second call is served from the cache; the producer result is unused.
/// let cached = cache
///     .remember("seo.example.com", || async {
///         Ok::<_, anyhow::Error>(json!("not computed"))
///     })
///     .await?;
/// assert_eq!(cached, report);
/// # Ok(())
/// # }
/// ```
pub struct ReadThroughCache {
    backend: Arc<dyn StorageBackend>,
    config: CacheConfig,
    stats: Arc<AtomicStats>,
}

impl ReadThroughCache {
    pub fn new(backend: Arc<dyn StorageBackend>, config: CacheConfig) -> Self {
        Self {
            backend,
            config,
            stats: Arc::new(AtomicStats::new()),
        }
    }

    /// Cache with the default configuration: 300 second TTL, enabled.
    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Self {
        Self::new(backend, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Cached value for `key`, or `None` when no live entry exists.
    ///
    /// A cache miss and a backend key rejection are indistinguishable here:
    /// both collapse to `None`, nothing is retried, and no error escapes.
    pub async fn get(&self, key: impl Into<CacheKey>) -> Option<Value> {
        if !self.config.enabled {
            return None;
        }
        let key = key.into();
        let has = match self.backend.has(&key).await {
            Ok(has) => has,
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "backend rejected key during existence check, treating as miss");
                return None;
            }
        };
        if !has {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "cache miss");
            return None;
        }
        match self.backend.get(&key).await {
            Ok(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "backend rejected key during read, treating as miss");
                None
            }
        }
    }

    /// Store `value` under `key` with the default TTL.
    pub async fn set(&self, key: impl Into<CacheKey>, value: &Value) -> bool {
        self.set_with_ttl(key, value, self.config.default_ttl).await
    }

    /// Store `value` under `key`. A zero `ttl` stores an entry that never
    /// expires.
    ///
    /// Returns whether the store succeeded; a backend key rejection folds
    /// into `false`.
    pub async fn set_with_ttl(
        &self,
        key: impl Into<CacheKey>,
        value: &Value,
        ttl: Duration,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }
        let key = key.into();
        match self.backend.set(&key, value, ttl).await {
            Ok(stored) => {
                if stored {
                    self.stats.sets.fetch_add(1, Ordering::Relaxed);
                }
                stored
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "backend rejected key during store");
                false
            }
        }
    }

    /// Cached value for `key`, or the producer's result, with the default
    /// TTL. See [`remember_with_ttl`](Self::remember_with_ttl).
    pub async fn remember<F, Fut, E>(
        &self,
        key: impl Into<CacheKey>,
        producer: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        self.remember_with_ttl(key, producer, self.config.default_ttl)
            .await
    }

    /// Cached value for `key`, or the producer's result.
    ///
    /// A cached value that is empty per
    /// [`is_empty_value`](crate::is_empty_value) counts as a miss and is
    /// recomputed. A produced `Bool(false)` is returned but never stored
    /// (the non-cacheable sentinel). The result of the store is deliberately
    /// not checked.
    ///
    /// The only error this can return is the producer's own; backend
    /// failures degrade to recomputation or a dropped write.
    pub async fn remember_with_ttl<F, Fut, E>(
        &self,
        key: impl Into<CacheKey>,
        producer: F,
        ttl: Duration,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        let key = key.into();
        if let Some(cached) = self.get(key.clone()).await {
            if !is_empty_value(&cached) {
                return Ok(cached);
            }
            debug!(key = %key, "cached value is empty, recomputing");
        }
        let value = producer().await?;
        if is_non_cacheable(&value) {
            debug!(key = %key, "producer returned the non-cacheable sentinel, skipping store");
        } else {
            let _ = self.set_with_ttl(key, &value, ttl).await;
        }
        Ok(value)
    }
}

impl Clone for ReadThroughCache {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}
