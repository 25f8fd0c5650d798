//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file e la discovery delle immagini.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva di immagini in directory
//! - Sostituzione sicura dei file con backup automatici
//! - Utilità per calcoli dimensioni e percentuali
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, JPEG, PNG
//!
//! ## Sicurezza operazioni:
//! - Backup automatico prima della sostituzione
//! - Rollback in caso di errore durante la scrittura
//!
//! ## Esempio:
//! ```rust,no_run
//! use media_minify::file_manager::FileManager;
//! use std::path::Path;
//!
//! let files = FileManager::find_image_files(Path::new("/path/to/media")).unwrap();
//! println!("{} images", files.len());
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Find all supported image files in a directory, sorted for stable output
    pub fn find_image_files(media_dir: &Path) -> Result<Vec<PathBuf>> {
        if !media_dir.is_dir() {
            return Err(anyhow::anyhow!("Not a directory: {}", media_dir.display()));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(media_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| Self::is_supported_format(path))
            .collect();

        files.sort();
        Ok(files)
    }

    /// Check if a file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            matches!(ext_lower.as_str(), "jpg" | "jpeg" | "png")
        } else {
            false
        }
    }

    /// Safely replace a file's content with optimized bytes
    pub async fn replace_file(original: &Path, data: &[u8]) -> Result<()> {
        let backup_path = original.with_extension(format!(
            "{}.backup",
            original.extension().unwrap_or_default().to_string_lossy()
        ));

        fs::copy(original, &backup_path).await?;

        match fs::write(original, data).await {
            Ok(()) => {
                let _ = fs::remove_file(&backup_path).await;
                Ok(())
            }
            Err(e) => {
                // restore from backup
                let _ = fs::copy(&backup_path, original).await;
                let _ = fs::remove_file(&backup_path).await;
                Err(e.into())
            }
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_image_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("2023/vacation");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("IMG_001.JPG"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("logo.png"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();

        let files = FileManager::find_image_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| FileManager::is_supported_format(f)));
    }

    #[tokio::test]
    async fn test_replace_file_removes_backup() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("photo.jpg");
        std::fs::write(&file, b"original").unwrap();

        FileManager::replace_file(&file, b"small").await.unwrap();

        assert_eq!(std::fs::read(&file).unwrap(), b"small");
        assert!(!temp_dir.path().join("photo.jpg.backup").exists());
    }

    #[test]
    fn test_format_size_and_reduction() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(1536), "1.50 KB");
        assert_eq!(FileManager::calculate_reduction(200, 150), 25.0);
        assert_eq!(FileManager::calculate_reduction(0, 10), 0.0);
    }
}
