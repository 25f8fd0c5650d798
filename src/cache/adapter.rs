//! # Cache Adapter
//!
//! Wrapper best-effort attorno a un `CacheStore`.
//!
//! - `Disabled`: ogni operazione è un no-op, lo store non viene mai toccato
//! - `Enabled`: una `get` fallita diventa "assente", una `put` fallita viene ignorata.
//!   Un panic dello store vale come errore dello store.

use super::{default_cache_dir, CacheStore, DiskStore};
use crate::config::CacheMode;
use crate::error::MinifyError;
use crate::fingerprint::Fingerprint;
use crate::optimizer::backend::panic_message;
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache handle used by the item processor
#[derive(Clone)]
pub enum CacheAdapter {
    Disabled,
    Enabled(Arc<dyn CacheStore>),
}

impl CacheAdapter {
    /// Resolve the cache mode into a handle backed by a `DiskStore`.
    ///
    /// The default location is resolved here, once, and passed to the store.
    pub fn configure(mode: &CacheMode) -> Self {
        match mode {
            CacheMode::Disabled => Self::Disabled,
            CacheMode::DefaultLocation => {
                let dir = default_cache_dir();
                debug!("Using default cache directory: {}", dir.display());
                Self::Enabled(Arc::new(DiskStore::new(dir)))
            }
            CacheMode::Explicit(dir) => {
                debug!("Using cache directory: {}", dir.display());
                Self::Enabled(Arc::new(DiskStore::new(dir.clone())))
            }
        }
    }

    /// Wrap an arbitrary store
    pub fn from_store(store: Arc<dyn CacheStore>) -> Self {
        Self::Enabled(store)
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Cached output for `key`, or `None` on miss, fault or disabled cache
    pub async fn get(&self, key: &Fingerprint) -> Option<Vec<u8>> {
        let Self::Enabled(store) = self else {
            return None;
        };

        let lookup = AssertUnwindSafe(store.get(key)).catch_unwind().await;
        match lookup.unwrap_or_else(|panic| Err(Self::store_panic(panic.as_ref()))) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    /// Store `data` under `key`; failures never reach the caller
    pub async fn put(&self, key: &Fingerprint, data: &[u8]) {
        let Self::Enabled(store) = self else {
            return;
        };

        let write = AssertUnwindSafe(store.put(key, data)).catch_unwind().await;
        if let Err(e) = write.unwrap_or_else(|panic| Err(Self::store_panic(panic.as_ref()))) {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }

    fn store_panic(panic: &(dyn std::any::Any + Send)) -> MinifyError {
        MinifyError::Cache(format!("cache store panicked: {}", panic_message(panic)))
    }
}

impl fmt::Debug for CacheAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("CacheAdapter::Disabled"),
            Self::Enabled(_) => f.write_str("CacheAdapter::Enabled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::OptimizerConfig;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &Fingerprint) -> Result<Option<Vec<u8>>, MinifyError> {
            Err(MinifyError::Cache("disk on fire".into()))
        }

        async fn put(&self, _key: &Fingerprint, _data: &[u8]) -> Result<(), MinifyError> {
            Err(MinifyError::Cache("disk on fire".into()))
        }
    }

    struct PanickingStore;

    #[async_trait]
    impl CacheStore for PanickingStore {
        async fn get(&self, _key: &Fingerprint) -> Result<Option<Vec<u8>>, MinifyError> {
            panic!("store crashed");
        }

        async fn put(&self, _key: &Fingerprint, _data: &[u8]) -> Result<(), MinifyError> {
            panic!("store crashed");
        }
    }

    fn key() -> Fingerprint {
        Fingerprint::compute(b"bytes", &OptimizerConfig::default()).unwrap()
    }

    #[test]
    fn test_configure_modes() {
        assert!(!CacheAdapter::configure(&CacheMode::Disabled).is_enabled());
        assert!(CacheAdapter::configure(&CacheMode::DefaultLocation).is_enabled());
        let explicit = CacheMode::Explicit(PathBuf::from("/tmp/mm"));
        assert!(CacheAdapter::configure(&explicit).is_enabled());
    }

    #[tokio::test]
    async fn test_faults_degrade_to_miss() {
        let adapter = CacheAdapter::from_store(Arc::new(BrokenStore));

        assert!(adapter.get(&key()).await.is_none());
        // must not panic or propagate
        adapter.put(&key(), b"data").await;
    }

    #[tokio::test]
    async fn test_store_panics_degrade_to_miss() {
        let adapter = CacheAdapter::from_store(Arc::new(PanickingStore));

        assert!(adapter.get(&key()).await.is_none());
        adapter.put(&key(), b"data").await;
    }

    #[tokio::test]
    async fn test_disabled_is_noop() {
        let adapter = CacheAdapter::Disabled;
        adapter.put(&key(), b"data").await;
        assert!(adapter.get(&key()).await.is_none());
    }

    #[tokio::test]
    async fn test_enabled_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let adapter = CacheAdapter::from_store(store.clone());

        adapter.put(&key(), b"data").await;
        assert_eq!(adapter.get(&key()).await.as_deref(), Some(&b"data"[..]));
        assert_eq!(store.len().await, 1);
    }
}
