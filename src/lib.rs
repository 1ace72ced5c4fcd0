//! 读穿缓存：命中即返回，未命中则计算、写回并返回，调用方无需感知缓存状态。
//!
//! # recache
//!
//! Read-through caching over pluggable storage backends. Given a key and a
//! producer function, [`ReadThroughCache::remember`] returns the cached value
//! if a fresh one exists, and otherwise runs the producer, stores the result
//! under a TTL, and returns it — callers never need to know whether a result
//! was cached or freshly computed.
//!
//! ## Overview
//!
//! Wrapping expensive computations (page audits, API calls, report
//! generation) in `remember` gives an application transparent caching with a
//! single policy knob: the TTL. A failing or misconfigured backend never
//! fails the application; it only costs recomputation and persistence.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ReadThroughCache`] | Get-or-compute-and-store orchestration |
//! | [`CacheConfig`] | Default TTL and enabled switch |
//! | [`CacheStats`] | Hit/miss/store/absorbed-error counters |
//! | [`StorageBackend`] | Trait for implementing custom backends |
//! | [`FilesystemBackend`] | On-disk backend, the out-of-the-box default |
//! | [`MemoryBackend`] | Bounded in-memory backend |
//! | [`NullBackend`] | No-op backend for disabling persistence |
//! | [`CacheKey`] | Validated text key |
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use recache::{CacheConfig, MemoryBackend, ReadThroughCache};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let config = CacheConfig::new().with_default_ttl(Duration::from_secs(600));
//! let cache = ReadThroughCache::new(Arc::new(MemoryBackend::new(10_000)), config);
//!
//! let score = cache
//!     .remember("page.load-time", || async {
//!         // expensive analysis goes here
//!         Ok::<_, anyhow::Error>(json!(1.42))
//!     })
//!     .await?;
//! assert_eq!(score, json!(1.42));
//! # Ok(())
//! # }
//! ```
//!
//! ## Empty values recompute
//!
//! A cached `0`, `""`, `false`, `[]`, `{}` or `Null` is treated as a miss by
//! `remember` and recomputed on every call — see [`is_empty_value`] for the
//! exact rule and its rationale. Producers can return `Bool(false)` to keep
//! a result out of the cache entirely while still handing it to the caller.

mod backend;
mod cache;
mod error;
mod fs;
mod key;
mod value;

pub use backend::{MemoryBackend, NullBackend, StorageBackend};
pub use cache::{CacheConfig, CacheStats, ReadThroughCache};
pub use error::KeyValidationError;
pub use fs::FilesystemBackend;
pub use key::CacheKey;
pub use value::{is_empty_value, is_non_cacheable, Value};
