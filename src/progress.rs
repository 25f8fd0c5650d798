//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di minificazione.
//!
//! ## Componenti principali:
//! - `ProgressManager`: progress bar con `indicatif`, aggiornata a ogni item completato
//! - `OptimizationStats`: statistiche cumulative della run
//!
//! ## Statistiche tracciate:
//! - **files_processed**: Totale file elaborati
//! - **files_optimized**: File effettivamente scritti in versione ottimizzata
//! - **files_skipped**: File lasciati invariati (riduzione insufficiente)
//! - **files_filtered**: File esclusi dal filtro
//! - **warnings** / **errors**: Problemi riportati dalla pipeline
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:04] [========================================] 150/150 (100%) photo.jpg: 45.2% saved
//! ```

use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for a minification run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for minification results
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OptimizationStats {
    pub files_processed: usize,
    pub files_optimized: usize,
    pub files_skipped: usize,
    pub files_filtered: usize,
    pub total_bytes_saved: u64,
    pub total_original_size: u64,
    pub warnings: usize,
    pub errors: usize,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_optimized(&mut self, original_size: u64, new_size: u64) {
        self.files_processed += 1;
        self.files_optimized += 1;
        self.total_original_size += original_size;
        self.total_bytes_saved += original_size.saturating_sub(new_size);
    }

    pub fn add_skipped(&mut self, original_size: u64) {
        self.files_processed += 1;
        self.files_skipped += 1;
        self.total_original_size += original_size;
    }

    pub fn add_filtered(&mut self, original_size: u64) {
        self.files_processed += 1;
        self.files_filtered += 1;
        self.total_original_size += original_size;
    }

    pub fn add_warnings(&mut self, count: usize) {
        self.warnings += count;
    }

    pub fn add_error(&mut self) {
        self.files_processed += 1;
        self.errors += 1;
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        if self.total_original_size > 0 {
            (self.total_bytes_saved as f64 / self.total_original_size as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Optimized: {} | Skipped: {} | Filtered: {} | Warnings: {} | Errors: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_optimized,
            self.files_skipped,
            self.files_filtered,
            self.warnings,
            self.errors,
            FileManager::format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }
}
