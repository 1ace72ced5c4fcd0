//! Storage backends: the capability contract plus the in-memory and null
//! reference implementations.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::KeyValidationError;
use crate::key::CacheKey;

/// Capability contract the read-through cache drives.
///
/// Implementations own entry storage and its whole lifecycle — expiration,
/// eviction, disk or memory management. The cache only orchestrates.
///
/// `get` on a key without a live entry is unspecified by the contract; the
/// cache always guards `get` with `has`. Each reference implementation
/// documents what it returns in that case.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Whether a live (non-expired) entry exists for `key`.
    async fn has(&self, key: &CacheKey) -> Result<bool, KeyValidationError>;

    /// The stored value of a live entry.
    async fn get(&self, key: &CacheKey) -> Result<Value, KeyValidationError>;

    /// Store `value` under `key`. A zero `ttl` means the entry never
    /// expires. Returns whether the store succeeded.
    async fn set(
        &self,
        key: &CacheKey,
        value: &Value,
        ttl: Duration,
    ) -> Result<bool, KeyValidationError>;
}

struct MemoryEntry {
    value: Value,
    expires_at: Option<Instant>,
    last_accessed: Instant,
}

impl MemoryEntry {
    fn new(value: Value, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = if ttl.is_zero() { None } else { Some(now + ttl) };
        Self {
            value,
            expires_at,
            last_accessed: now,
        }
    }

    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }
}

/// In-memory backend with bounded capacity.
///
/// Expired entries are dropped lazily on access; when the map is full, the
/// least recently accessed entry is evicted first. `get` on a missing or
/// expired entry returns `Null`.
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    max_entries: usize,
}

impl MemoryBackend {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap()
            .values()
            .filter(|e| !e.is_expired())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_if_needed(&self, entries: &mut HashMap<String, MemoryEntry>) {
        entries.retain(|_, e| !e.is_expired());
        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                entries.remove(&k);
            } else {
                break;
            }
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn has(&self, key: &CacheKey) -> Result<bool, KeyValidationError> {
        key.validate()?;
        let mut entries = self.entries.write().unwrap();
        match entries.get(key.as_str()).map(|e| e.is_expired()) {
            Some(true) => {
                entries.remove(key.as_str());
                Ok(false)
            }
            Some(false) => Ok(true),
            None => Ok(false),
        }
    }

    async fn get(&self, key: &CacheKey) -> Result<Value, KeyValidationError> {
        key.validate()?;
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get_mut(key.as_str()) {
            if entry.is_expired() {
                entries.remove(key.as_str());
                return Ok(Value::Null);
            }
            entry.last_accessed = Instant::now();
            return Ok(entry.value.clone());
        }
        Ok(Value::Null)
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: &Value,
        ttl: Duration,
    ) -> Result<bool, KeyValidationError> {
        key.validate()?;
        let mut entries = self.entries.write().unwrap();
        self.evict_if_needed(&mut entries);
        entries.insert(
            key.as_str().to_string(),
            MemoryEntry::new(value.clone(), ttl),
        );
        Ok(true)
    }
}

/// Backend that stores nothing.
///
/// `has` is always false and writes are accepted and discarded, so a cache
/// over it recomputes on every call. Lets an application switch persistence
/// off without touching call sites. `get` returns `Null`.
pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for NullBackend {
    async fn has(&self, _key: &CacheKey) -> Result<bool, KeyValidationError> {
        Ok(false)
    }

    async fn get(&self, _key: &CacheKey) -> Result<Value, KeyValidationError> {
        Ok(Value::Null)
    }

    async fn set(
        &self,
        _key: &CacheKey,
        _value: &Value,
        _ttl: Duration,
    ) -> Result<bool, KeyValidationError> {
        Ok(true)
    }
}
