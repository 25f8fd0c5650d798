//! # Cache Module
//!
//! Memoizzazione dei risultati di ottimizzazione su uno store chiave/valore.
//!
//! ## Componenti:
//! - `CacheStore`: trait dello storage fisico (get/put asincroni)
//! - `CacheAdapter`: wrapper best-effort usato dalla pipeline, disattivabile
//! - `DiskStore`: store content-addressable su filesystem
//! - `MemoryStore`: store in memoria, per embedding e test
//!
//! ## Politica:
//! La cache è solo un'ottimizzazione di performance. Ogni guasto dello storage
//! viene loggato e trattato come cache vuota per quella chiave.

pub mod adapter;
pub mod disk_store;
pub mod memory_store;

pub use adapter::CacheAdapter;
pub use disk_store::DiskStore;
pub use memory_store::MemoryStore;

use crate::error::MinifyError;
use crate::fingerprint::Fingerprint;
use async_trait::async_trait;
use std::path::PathBuf;

/// Physical key/value storage for optimized payloads.
///
/// Implementations must tolerate concurrent `get`/`put` on the same key and
/// must never hand out a partially written value.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a key. A missing key is `Ok(None)`, not an error.
    async fn get(&self, key: &Fingerprint) -> Result<Option<Vec<u8>>, MinifyError>;

    /// Store the value for a key, replacing any previous one
    async fn put(&self, key: &Fingerprint, data: &[u8]) -> Result<(), MinifyError>;
}

/// Conventional per-user cache directory used when caching is enabled without a path
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("media-minify")
}
