//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path di output per la modalità output directory.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Path di output che preserva la struttura relativa a `input_base_dir`
    pub fn get_output_path(input_path: &Path, input_base_dir: &Path, output_dir: &Path) -> PathBuf {
        let relative_path = match input_path.strip_prefix(input_base_dir) {
            Ok(rel) => rel.to_path_buf(),
            Err(e) => {
                debug!("Strip prefix failed for {}: {} - fallback to file name", input_path.display(), e);
                input_path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| input_path.to_path_buf())
            }
        };

        let result = output_dir.join(relative_path);
        debug!("Resolved output path: {} -> {}", input_path.display(), result.display());
        result
    }

    /// Crea le directory parent se necessario
    pub async fn ensure_parent_dirs(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow::anyhow!("Failed to create parent directories for {}: {}", path.display(), e)
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_relative_structure() {
        let output = PathResolver::get_output_path(
            Path::new("/src/photos/2023/vacation/IMG_001.jpg"),
            Path::new("/src/photos"),
            Path::new("/dest"),
        );
        assert_eq!(output, PathBuf::from("/dest/2023/vacation/IMG_001.jpg"));
    }

    #[test]
    fn test_outside_base_falls_back_to_file_name() {
        let output = PathResolver::get_output_path(
            Path::new("/elsewhere/logo.png"),
            Path::new("/src/photos"),
            Path::new("/dest"),
        );
        assert_eq!(output, PathBuf::from("/dest/logo.png"));
    }

    #[tokio::test]
    async fn test_ensure_parent_dirs() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("a/b/c.png");
        PathResolver::ensure_parent_dirs(&target).await.unwrap();
        assert!(temp_dir.path().join("a/b").is_dir());
    }
}
