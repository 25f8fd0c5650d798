//! # Disk Cache Store
//!
//! Store content-addressable su filesystem.
//!
//! ## Layout:
//! ```text
//! <root>/ab/cd/abcd1234...   (chiave = fingerprint hex)
//! ```
//!
//! ## Formato entry:
//! `MMCACHE1` + SHA-256 del payload (32 bytes) + payload.
//! Un'entry che non supera il controllo di integrità è un guasto di lettura.
//!
//! ## Scritture atomiche:
//! Il payload viene scritto in un file temporaneo nella stessa directory e poi
//! rinominato sulla destinazione, quindi una `get` concorrente vede il valore
//! vecchio o quello nuovo, mai uno parziale.

use super::CacheStore;
use crate::error::MinifyError;
use crate::fingerprint::Fingerprint;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENTRY_MAGIC: &[u8; 8] = b"MMCACHE1";
const DIGEST_LEN: usize = 32;

/// Filesystem-backed cache store
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Directories are created lazily on the first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn entry_path(&self, key: &Fingerprint) -> PathBuf {
        let key = key.as_str();
        self.root.join(&key[..2]).join(&key[2..4]).join(key)
    }

    fn encode(data: &[u8]) -> Vec<u8> {
        let mut framed = Vec::with_capacity(ENTRY_MAGIC.len() + DIGEST_LEN + data.len());
        framed.extend_from_slice(ENTRY_MAGIC);
        framed.extend_from_slice(&Sha256::digest(data));
        framed.extend_from_slice(data);
        framed
    }

    fn decode(key: &Fingerprint, raw: Vec<u8>) -> Result<Vec<u8>, MinifyError> {
        let header_len = ENTRY_MAGIC.len() + DIGEST_LEN;
        if raw.len() < header_len || &raw[..ENTRY_MAGIC.len()] != ENTRY_MAGIC {
            return Err(MinifyError::Cache(format!("Malformed cache entry {}", key)));
        }

        let (header, payload) = raw.split_at(header_len);
        if Sha256::digest(payload).as_slice() != &header[ENTRY_MAGIC.len()..] {
            return Err(MinifyError::Cache(format!("Integrity check failed for cache entry {}", key)));
        }

        Ok(payload.to_vec())
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &Fingerprint) -> Result<Option<Vec<u8>>, MinifyError> {
        let path = self.entry_path(key);
        match tokio::fs::read(&path).await {
            Ok(raw) => Self::decode(key, raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &Fingerprint, data: &[u8]) -> Result<(), MinifyError> {
        let path = self.entry_path(key);
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| MinifyError::Cache(format!("Invalid cache path: {}", path.display())))?;

        tokio::fs::create_dir_all(&parent).await?;

        let framed = Self::encode(data);
        tokio::task::spawn_blocking(move || -> Result<(), MinifyError> {
            let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
            temp.write_all(&framed)?;
            temp.as_file().sync_all()?;
            temp.persist(&path).map_err(|e| MinifyError::Io(e.error))?;
            debug!("Cache entry written: {}", path.display());
            Ok(())
        })
        .await
        .map_err(|e| MinifyError::Cache(format!("Cache write task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerConfig;
    use tempfile::TempDir;

    fn key(input: &[u8]) -> Fingerprint {
        Fingerprint::compute(input, &OptimizerConfig::with_plugins(["jpegtran"])).unwrap()
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path().join("cache"));
        let key = key(b"image");

        assert!(store.get(&key).await.unwrap().is_none());
        store.put(&key, b"smaller image").await.unwrap();

        let cached = store.get(&key).await.unwrap();
        assert_eq!(cached.as_deref(), Some(&b"smaller image"[..]));
        assert!(store.entry_path(&key).starts_with(store.root()));
    }

    #[tokio::test]
    async fn test_put_replaces_existing_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path());
        let key = key(b"image");

        store.put(&key, b"first").await.unwrap();
        store.put(&key, b"second").await.unwrap();

        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some(&b"second"[..]));
    }

    #[tokio::test]
    async fn test_tampered_entry_is_a_fault() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path());
        let key = key(b"image");

        store.put(&key, b"payload").await.unwrap();
        let path = store.entry_path(&key);
        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        std::fs::write(&path, raw).unwrap();

        assert!(matches!(store.get(&key).await, Err(MinifyError::Cache(_))));
    }

    #[tokio::test]
    async fn test_truncated_entry_is_a_fault() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path());
        let key = key(b"image");

        let path = store.entry_path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"MMC").unwrap();

        assert!(store.get(&key).await.is_err());
    }
}
