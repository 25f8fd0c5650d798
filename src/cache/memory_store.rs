//! In-memory `CacheStore`, shared across tasks through an async `RwLock`.

use super::CacheStore;
use crate::error::MinifyError;
use crate::fingerprint::Fingerprint;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<Fingerprint, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &Fingerprint) -> Result<Option<Vec<u8>>, MinifyError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &Fingerprint, data: &[u8]) -> Result<(), MinifyError> {
        self.entries.write().await.insert(key.clone(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerConfig;

    #[tokio::test]
    async fn test_get_after_put() {
        let store = MemoryStore::new();
        let key = Fingerprint::compute(b"abc", &OptimizerConfig::default()).unwrap();

        assert!(store.get(&key).await.unwrap().is_none());
        store.put(&key, b"optimized").await.unwrap();

        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some(&b"optimized"[..]));
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_put_replaces_entry() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let key = Fingerprint::compute(b"abc", &OptimizerConfig::default()).unwrap();

            store.put(&key, b"first").await.unwrap();
            store.put(&key, b"second").await.unwrap();

            assert_eq!(store.get(&key).await.unwrap().as_deref(), Some(&b"second"[..]));
            assert_eq!(store.len().await, 1);
        });
    }
}
