//! # Fingerprint Module
//!
//! Calcola la chiave di cache content-addressable di un item.
//!
//! ## Responsabilità:
//! - Deriva una chiave stabile da (bytes di input, configurazione del backend)
//! - Funzione pura: nessun timestamp, nessun path su disco
//! - Stessa chiave tra esecuzioni e processi diversi
//!
//! ## Formato:
//! SHA-256 su una codifica length-prefixed di: tag di schema, bytes di input,
//! JSON canonico della configurazione (le mappe di `serde_json` sono ordinate).

use crate::config::OptimizerConfig;
use crate::error::MinifyError;
use sha2::{Digest, Sha256};
use std::fmt;

/// Bumped whenever the cached value format or the key layout changes
const CACHE_SCHEMA: &str = concat!("media-minify/v1/", env!("CARGO_PKG_VERSION"));

/// Content-addressable cache key (lowercase hex SHA-256)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the key for `input` optimized with `config`
    pub fn compute(input: &[u8], config: &OptimizerConfig) -> Result<Self, MinifyError> {
        let serialized_config = serde_json::to_vec(config)?;

        let mut hasher = Sha256::new();
        for part in [CACHE_SCHEMA.as_bytes(), input, serialized_config.as_slice()] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }

        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginSpec;

    #[test]
    fn test_same_input_same_key() {
        let config = OptimizerConfig::with_plugins(["jpegtran"]);
        let first = Fingerprint::compute(b"payload", &config).unwrap();
        let second = Fingerprint::compute(b"payload", &config.clone()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
    }

    #[test]
    fn test_config_changes_key() {
        let plain = OptimizerConfig::with_plugins(["mozjpeg"]);
        let tuned = OptimizerConfig {
            plugins: vec![PluginSpec::with_options(
                "mozjpeg",
                serde_json::json!({ "quality": 60 }),
            )],
        };

        let a = Fingerprint::compute(b"payload", &plain).unwrap();
        let b = Fingerprint::compute(b"payload", &tuned).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_input_changes_key() {
        let config = OptimizerConfig::with_plugins(["oxipng"]);
        let a = Fingerprint::compute(b"payload-a", &config).unwrap();
        let b = Fingerprint::compute(b"payload-b", &config).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_option_key_order_is_irrelevant() {
        let a = OptimizerConfig {
            plugins: vec![PluginSpec::with_options(
                "mozjpeg",
                serde_json::from_str(r#"{"quality": 70, "progressive": true}"#).unwrap(),
            )],
        };
        let b = OptimizerConfig {
            plugins: vec![PluginSpec::with_options(
                "mozjpeg",
                serde_json::from_str(r#"{"progressive": true, "quality": 70}"#).unwrap(),
            )],
        };

        assert_eq!(
            Fingerprint::compute(b"x", &a).unwrap(),
            Fingerprint::compute(b"x", &b).unwrap()
        );
    }
}
