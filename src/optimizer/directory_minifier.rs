//! # Directory Minifier
//!
//! Orchestratore della CLI: collega la discovery dei file, la pipeline batch
//! e la politica di scrittura su disco.
//!
//! ## Responsabilità:
//! - Discovery delle immagini e lettura in `WorkItem` (lettura fallita = item senza input)
//! - Esecuzione del batch con progress bar o messaggi JSON
//! - Scrittura dell'output solo se `output < original * size_threshold`,
//!   in place (con backup) o nella directory di output preservando la struttura
//! - Statistiche finali della run

use crate::{
    config::Config,
    file_manager::FileManager,
    item::{MinifyResult, WorkItem},
    json_output::{FileStatus, JsonConfig, JsonMessage},
    optimizer::{
        backend::Optimizer, batch::Minifier, command_backend::CommandOptimizer,
        path_resolver::PathResolver,
    },
    progress::{OptimizationStats, ProgressManager},
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs the minification pipeline over every image in a directory
pub struct DirectoryMinifier {
    config: Config,
    minifier: Minifier,
    input_base_dir: PathBuf,
}

impl DirectoryMinifier {
    /// Crea un minifier con il backend a tool esterni
    pub fn new(media_dir: &Path, config: Config) -> Result<Self> {
        let optimizer = CommandOptimizer::new();
        let available = optimizer.available_tools();
        if available.is_empty() {
            warn!("No optimization tools found on this system, files will be left untouched");
        } else {
            debug!("Available optimization tools: {}", available.join(", "));
        }

        Self::with_optimizer(media_dir, config, Arc::new(optimizer))
    }

    /// Crea un minifier con un backend arbitrario
    pub fn with_optimizer(media_dir: &Path, config: Config, optimizer: Arc<dyn Optimizer>) -> Result<Self> {
        config.validate()?;
        if !media_dir.is_dir() {
            return Err(anyhow::anyhow!("Media directory does not exist: {}", media_dir.display()));
        }

        let minifier = Minifier::new(optimizer, config.minify_options());
        Ok(Self {
            config,
            minifier,
            input_base_dir: media_dir.to_path_buf(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Esegue la run completa e restituisce le statistiche
    pub async fn run(&self) -> Result<OptimizationStats> {
        let start_time = Instant::now();
        let files = FileManager::find_image_files(&self.input_base_dir)?;

        self.emit_start_message(&files);
        self.log_configuration(&files);

        let mut stats = OptimizationStats::new();
        if files.is_empty() {
            if !self.config.json_output {
                info!("No image files found to process");
            }
            self.print_final_stats(&stats, start_time.elapsed().as_secs_f64());
            return Ok(stats);
        }

        let items = Self::load_items(&files).await;

        let progress = (!self.config.json_output).then(|| ProgressManager::new(files.len() as u64));
        let results = self
            .minifier
            .run_with_progress(items, |index, result| {
                if let Some(ref progress) = progress {
                    progress.update(&Self::describe(&files[index], result));
                }
            })
            .await;

        for (file, result) in files.iter().zip(results.iter()) {
            self.handle_result(file, result, &mut stats).await;
        }

        if let Some(ref progress) = progress {
            progress.finish(&stats.format_summary());
        }

        self.print_final_stats(&stats, start_time.elapsed().as_secs_f64());
        Ok(stats)
    }

    /// Legge i file in parallelo; un errore di lettura produce un item senza input
    async fn load_items(files: &[PathBuf]) -> Vec<WorkItem> {
        futures::future::join_all(files.iter().map(|file| async move {
            let path = file.to_string_lossy().to_string();
            match tokio::fs::read(file).await {
                Ok(bytes) => WorkItem::new(bytes, path),
                Err(e) => {
                    warn!("Failed to read {}: {}", file.display(), e);
                    WorkItem {
                        input: None,
                        path: Some(path),
                    }
                }
            }
        }))
        .await
    }

    fn describe(file: &Path, result: &MinifyResult) -> String {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if !result.errors.is_empty() {
            return format!("{}: failed", name);
        }
        if result.filtered {
            return format!("{}: filtered", name);
        }

        match (&result.input, &result.output) {
            (Some(input), Some(output)) => format!(
                "{}: {:.1}% saved",
                name,
                FileManager::calculate_reduction(input.len() as u64, output.len() as u64)
            ),
            _ => name,
        }
    }

    /// Applica la politica di scrittura a un risultato e aggiorna le statistiche
    async fn handle_result(&self, file: &Path, result: &MinifyResult, stats: &mut OptimizationStats) {
        let warnings: Vec<String> = result.warnings.iter().map(|w| w.to_string()).collect();
        let errors: Vec<String> = result.errors.iter().map(|e| e.to_string()).collect();
        stats.add_warnings(warnings.len());
        for warning in &warnings {
            warn!("{}: {}", file.display(), warning);
        }

        let original_size = result.input.as_ref().map_or(0, |i| i.len() as u64);

        if !errors.is_empty() {
            for message in &errors {
                error!("{}: {}", file.display(), message);
            }
            stats.add_error();
            self.emit_file_complete(file, original_size, original_size, FileStatus::Failed, warnings, errors);
            return;
        }

        let (Some(input), Some(output)) = (&result.input, &result.output) else {
            stats.add_error();
            return;
        };

        let status = if result.filtered {
            FileStatus::Filtered
        } else if self.is_worth_writing(input.len(), output.len()) {
            FileStatus::Optimized
        } else {
            FileStatus::Skipped
        };

        let data = if status == FileStatus::Optimized { output } else { input };
        if let Err(e) = self.write_output(file, data, status == FileStatus::Optimized).await {
            error!("Failed to write {}: {}", file.display(), e);
            stats.add_error();
            let errors = vec![e.to_string()];
            self.emit_file_complete(file, original_size, original_size, FileStatus::Failed, warnings, errors);
            return;
        }

        match status {
            FileStatus::Optimized => {
                debug!(
                    "{}: {} -> {}",
                    file.display(),
                    FileManager::format_size(original_size),
                    FileManager::format_size(output.len() as u64)
                );
                stats.add_optimized(original_size, output.len() as u64);
            }
            FileStatus::Filtered => stats.add_filtered(original_size),
            _ => stats.add_skipped(original_size),
        }

        self.emit_file_complete(file, original_size, data.len() as u64, status, warnings, Vec::new());
    }

    fn is_worth_writing(&self, original_size: usize, new_size: usize) -> bool {
        (new_size as f64) < (original_size as f64) * self.config.size_threshold
    }

    /// In modalità output directory anche i file invariati vengono copiati
    async fn write_output(&self, file: &Path, data: &[u8], changed: bool) -> Result<()> {
        if self.config.dry_run {
            debug!("Dry run: not writing {}", file.display());
            return Ok(());
        }

        match self.config.output_path {
            Some(ref output_dir) => {
                let target = PathResolver::get_output_path(file, &self.input_base_dir, output_dir);
                PathResolver::ensure_parent_dirs(&target).await?;
                tokio::fs::write(&target, data).await?;
                Ok(())
            }
            None if changed => FileManager::replace_file(file, data).await,
            None => Ok(()),
        }
    }

    fn emit_start_message(&self, files: &[PathBuf]) {
        if self.config.json_output {
            JsonMessage::start(
                self.input_base_dir.clone(),
                self.config.output_path.clone(),
                files.len(),
                JsonConfig::from(&self.config),
            )
            .emit();
        } else {
            info!("Starting minification in: {}", self.input_base_dir.display());
        }
    }

    fn emit_file_complete(
        &self,
        file: &Path,
        original_size: u64,
        final_size: u64,
        status: FileStatus,
        warnings: Vec<String>,
        errors: Vec<String>,
    ) {
        if self.config.json_output {
            JsonMessage::file_complete(file.to_path_buf(), original_size, final_size, status, warnings, errors)
                .emit();
        }
    }

    fn log_configuration(&self, files: &[PathBuf]) {
        if self.config.json_output {
            return;
        }

        let plugins: Vec<&str> = self.config.plugins.iter().map(|p| p.name.as_str()).collect();
        info!("Plugins: {}", plugins.join(", "));
        match self.config.output_path {
            Some(ref output_path) => info!("Output directory: {}", output_path.display()),
            None => info!("Mode: Replace files in place"),
        }
        if !self.config.cache.is_enabled() {
            info!("Cache disabled");
        }
        if self.config.dry_run {
            info!("Dry run mode: No files will be modified");
        }
        info!("Found {} image files to process", files.len());
    }

    fn print_final_stats(&self, stats: &OptimizationStats, duration: f64) {
        if self.config.json_output {
            JsonMessage::complete(stats, duration).emit();
        } else {
            info!("=== Minification Complete ===");
            info!("{}", stats.format_summary());
            info!("Duration: {:.2}s", duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{CacheMode, OptimizerConfig},
        error::MinifyError,
        optimizer::backend::Outcome,
    };
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Keeps the first half of every input, fails on `BAD`
    struct HalvingOptimizer;

    #[async_trait]
    impl Optimizer for HalvingOptimizer {
        async fn optimize(&self, input: &[u8], _config: &OptimizerConfig) -> Result<Outcome, MinifyError> {
            if input.starts_with(b"BAD") {
                return Err(MinifyError::Optimization("Corrupt JPEG data".to_string()));
            }
            Ok(Outcome::Optimized(input[..input.len() / 2].to_vec()))
        }
    }

    fn base_config() -> Config {
        Config {
            cache: CacheMode::Disabled,
            ..Config::default()
        }
    }

    fn minifier(dir: &Path, config: Config) -> DirectoryMinifier {
        DirectoryMinifier::with_optimizer(dir, config, Arc::new(HalvingOptimizer)).unwrap()
    }

    #[tokio::test]
    async fn test_replaces_files_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("photo.jpg");
        std::fs::write(&file, b"0123456789").unwrap();

        let stats = minifier(temp_dir.path(), base_config()).run().await.unwrap();

        assert_eq!(stats.files_optimized, 1);
        assert_eq!(stats.total_bytes_saved, 5);
        assert_eq!(std::fs::read(&file).unwrap(), b"01234");
    }

    #[tokio::test]
    async fn test_threshold_keeps_original() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("photo.jpg");
        std::fs::write(&file, b"0123456789").unwrap();

        let config = Config {
            size_threshold: 0.4,
            ..base_config()
        };
        let stats = minifier(temp_dir.path(), config).run().await.unwrap();

        assert_eq!(stats.files_skipped, 1);
        assert_eq!(std::fs::read(&file).unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn test_output_directory_preserves_structure() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        std::fs::create_dir_all(source.path().join("2023")).unwrap();
        std::fs::write(source.path().join("2023/a.png"), b"abcdefgh").unwrap();
        std::fs::write(source.path().join("b.jpg"), b"BAD bytes").unwrap();

        let config = Config {
            output_path: Some(dest.path().to_path_buf()),
            ..base_config()
        };
        let stats = minifier(source.path(), config).run().await.unwrap();

        assert_eq!(stats.files_optimized, 1);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.warnings, 1);
        assert_eq!(std::fs::read(dest.path().join("2023/a.png")).unwrap(), b"abcd");
        assert_eq!(std::fs::read(dest.path().join("b.jpg")).unwrap(), b"BAD bytes");
        assert_eq!(std::fs::read(source.path().join("2023/a.png")).unwrap(), b"abcdefgh");
    }

    #[tokio::test]
    async fn test_bail_counts_errors() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("broken.jpg"), b"BAD bytes").unwrap();

        let config = Config {
            bail: true,
            ..base_config()
        };
        let stats = minifier(temp_dir.path(), config).run().await.unwrap();

        assert_eq!(stats.errors, 1);
        assert_eq!(std::fs::read(temp_dir.path().join("broken.jpg")).unwrap(), b"BAD bytes");
    }

    #[tokio::test]
    async fn test_min_size_and_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("tiny.png"), b"ab").unwrap();
        std::fs::write(temp_dir.path().join("big.png"), b"0123456789").unwrap();

        let config = Config {
            min_size: Some(5),
            dry_run: true,
            ..base_config()
        };
        let stats = minifier(temp_dir.path(), config).run().await.unwrap();

        assert_eq!(stats.files_filtered, 1);
        assert_eq!(stats.files_optimized, 1);
        assert_eq!(std::fs::read(temp_dir.path().join("big.png")).unwrap(), b"0123456789");
    }

    #[test]
    fn test_rejects_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(DirectoryMinifier::with_optimizer(&missing, base_config(), Arc::new(HalvingOptimizer)).is_err());
    }
}
