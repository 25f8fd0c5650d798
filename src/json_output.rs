//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico della CLI.
//!
//! ## Responsabilità:
//! - Emette una riga JSON per evento su stdout
//! - Riporta warning ed errori della pipeline per ogni file
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio della run
//! - `file_complete`: Fine elaborazione di un file
//! - `complete`: Fine della run con statistiche finali
//! - `error`: Errore generale

use crate::{config::Config, file_manager::FileManager, progress::OptimizationStats};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Esito di un singolo file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Optimized,
    Skipped,
    Filtered,
    Failed,
}

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio della run
    Start {
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        total_files: usize,
        config: JsonConfig,
    },

    /// Fine elaborazione di un file specifico
    FileComplete {
        path: PathBuf,
        original_size: u64,
        optimized_size: u64,
        reduction_percent: f64,
        status: FileStatus,
        warnings: Vec<String>,
        errors: Vec<String>,
    },

    /// Run completata
    Complete {
        files_processed: usize,
        files_optimized: usize,
        files_skipped: usize,
        files_filtered: usize,
        warnings: usize,
        errors: usize,
        total_bytes_saved: u64,
        average_reduction: f64,
        duration_seconds: f64,
    },

    /// Errore generale
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione riportata nel messaggio `start`
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonConfig {
    pub plugins: Vec<String>,
    pub cache: bool,
    pub bail: bool,
    pub workers: Option<usize>,
    pub size_threshold: f64,
    pub dry_run: bool,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(input_dir: PathBuf, output_dir: Option<PathBuf>, total_files: usize, config: JsonConfig) -> Self {
        Self::Start {
            input_dir,
            output_dir,
            total_files,
            config,
        }
    }

    pub fn file_complete(
        path: PathBuf,
        original_size: u64,
        optimized_size: u64,
        status: FileStatus,
        warnings: Vec<String>,
        errors: Vec<String>,
    ) -> Self {
        Self::FileComplete {
            path,
            original_size,
            optimized_size,
            reduction_percent: FileManager::calculate_reduction(original_size, optimized_size),
            status,
            warnings,
            errors,
        }
    }

    pub fn complete(stats: &OptimizationStats, duration_seconds: f64) -> Self {
        Self::Complete {
            files_processed: stats.files_processed,
            files_optimized: stats.files_optimized,
            files_skipped: stats.files_skipped,
            files_filtered: stats.files_filtered,
            warnings: stats.warnings,
            errors: stats.errors,
            total_bytes_saved: stats.total_bytes_saved,
            average_reduction: stats.overall_reduction_percent(),
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            plugins: config.plugins.iter().map(|p| p.name.clone()).collect(),
            cache: config.cache.is_enabled(),
            bail: config.bail,
            workers: config.workers,
            size_threshold: config.size_threshold,
            dry_run: config.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_complete_wire_form() {
        let message = JsonMessage::file_complete(
            PathBuf::from("a.png"),
            200,
            150,
            FileStatus::Optimized,
            Vec::new(),
            Vec::new(),
        );
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["type"], "file_complete");
        assert_eq!(value["status"], "optimized");
        assert_eq!(value["reduction_percent"], 25.0);
    }

    #[test]
    fn test_start_reports_plugin_names() {
        let config = Config::default();
        let message = JsonMessage::start(PathBuf::from("media"), None, 3, JsonConfig::from(&config));
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["type"], "start");
        assert_eq!(value["config"]["plugins"], serde_json::json!(["jpegtran", "oxipng"]));
        assert_eq!(value["config"]["cache"], true);
    }
}
