//! Filesystem-backed storage, the out-of-the-box default backend.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::backend::StorageBackend;
use crate::error::KeyValidationError;
use crate::key::CacheKey;

const DEFAULT_NAMESPACE: &str = "app";

/// One entry on disk: the payload plus its expiration instant.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    /// Unix timestamp in milliseconds; `None` never expires.
    expires_at: Option<u64>,
    value: Value,
}

impl StoredEntry {
    fn new(value: &Value, ttl: Duration) -> Self {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(unix_now_millis() + ttl.as_millis() as u64)
        };
        Self {
            expires_at,
            value: value.clone(),
        }
    }

    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => unix_now_millis() >= at,
            None => false,
        }
    }
}

fn unix_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Filesystem-backed storage.
///
/// Each entry is a JSON file at `<root>/<namespace>/<sha256(key)>.json`;
/// hashing keeps file names independent of key length and charset. Entries
/// survive process restarts, and expired ones are pruned lazily the next
/// time `has` sees them.
///
/// I/O failures never surface: a missing or unreadable file reads as a miss
/// (`has` → false, `get` → `Null`) and a failed write reports an
/// unsuccessful store. Only key validation produces an error.
pub struct FilesystemBackend {
    root: PathBuf,
    namespace: String,
}

impl FilesystemBackend {
    /// Backend rooted at `root` with the default `"app"` namespace.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_namespace(root, DEFAULT_NAMESPACE)
    }

    /// Backend rooted at `root`, entries scoped under `namespace`.
    ///
    /// Two backends sharing a root but not a namespace never see each
    /// other's entries.
    pub fn with_namespace(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn entry_dir(&self) -> PathBuf {
        self.root.join(&self.namespace)
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_str().as_bytes());
        let name: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        self.entry_dir().join(format!("{}.json", name))
    }

    fn read_entry(&self, key: &CacheKey) -> Option<StoredEntry> {
        let bytes = fs::read(self.entry_path(key)).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn has(&self, key: &CacheKey) -> Result<bool, KeyValidationError> {
        key.validate()?;
        match self.read_entry(key) {
            Some(entry) if entry.is_expired() => {
                let _ = fs::remove_file(self.entry_path(key));
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn get(&self, key: &CacheKey) -> Result<Value, KeyValidationError> {
        key.validate()?;
        match self.read_entry(key) {
            Some(entry) if !entry.is_expired() => Ok(entry.value),
            _ => Ok(Value::Null),
        }
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: &Value,
        ttl: Duration,
    ) -> Result<bool, KeyValidationError> {
        key.validate()?;
        let entry = StoredEntry::new(value, ttl);
        let payload = match serde_json::to_vec(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode cache entry");
                return Ok(false);
            }
        };
        let dir = self.entry_dir();
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(path = %dir.display(), error = %e, "failed to create cache directory");
            return Ok(false);
        }
        match fs::write(self.entry_path(key), payload) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to write cache entry");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const NO_EXPIRY: Duration = Duration::ZERO;

    fn key(s: &str) -> CacheKey {
        CacheKey::from(s)
    }

    #[tokio::test]
    async fn round_trip() {
        let dir = tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let k = key("report");

        assert!(!backend.has(&k).await.unwrap());
        assert!(backend
            .set(&k, &json!({ "score": 87 }), NO_EXPIRY)
            .await
            .unwrap());
        assert!(backend.has(&k).await.unwrap());
        assert_eq!(backend.get(&k).await.unwrap(), json!({ "score": 87 }));
    }

    #[tokio::test]
    async fn entries_survive_a_fresh_handle() {
        let dir = tempdir().unwrap();
        let k = key("durable");
        {
            let backend = FilesystemBackend::new(dir.path());
            backend.set(&k, &json!([1, 2, 3]), NO_EXPIRY).await.unwrap();
        }
        let reopened = FilesystemBackend::new(dir.path());
        assert!(reopened.has(&k).await.unwrap());
        assert_eq!(reopened.get(&k).await.unwrap(), json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn expired_entries_are_pruned() {
        let dir = tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let k = key("short-lived");
        backend
            .set(&k, &json!("v"), Duration::from_millis(30))
            .await
            .unwrap();
        assert!(backend.has(&k).await.unwrap());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!backend.has(&k).await.unwrap());
        assert!(!backend.entry_path(&k).exists());
        assert_eq!(backend.get(&k).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn zero_ttl_never_expires() {
        let dir = tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let k = key("pinned");
        backend.set(&k, &json!(true), NO_EXPIRY).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(backend.has(&k).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_entry_reads_as_miss() {
        let dir = tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        let k = key("corrupt");
        backend.set(&k, &json!(1), NO_EXPIRY).await.unwrap();
        fs::write(backend.entry_path(&k), b"not json").unwrap();

        assert!(!backend.has(&k).await.unwrap());
        assert_eq!(backend.get(&k).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let dir = tempdir().unwrap();
        let a = FilesystemBackend::with_namespace(dir.path(), "a");
        let b = FilesystemBackend::with_namespace(dir.path(), "b");
        let k = key("shared-name");

        a.set(&k, &json!("from a"), NO_EXPIRY).await.unwrap();
        assert!(a.has(&k).await.unwrap());
        assert!(!b.has(&k).await.unwrap());
    }

    #[tokio::test]
    async fn invalid_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        for bad in ["", "a@b", "a/b"] {
            let bad = key(bad);
            assert!(backend.has(&bad).await.is_err());
            assert!(backend.get(&bad).await.is_err());
            assert!(backend.set(&bad, &json!(1), NO_EXPIRY).await.is_err());
        }
    }
}
