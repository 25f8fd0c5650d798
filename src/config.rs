//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione della pipeline e della CLI.
//!
//! ## Responsabilità:
//! - Definisce `OptimizerConfig` / `PluginSpec`, la configurazione opaca passata al backend
//! - Definisce `CacheMode` con la forma `false | true | "path"` usata nei file JSON
//! - Definisce `MinifyOptions`, le opzioni runtime della pipeline (incluso il filtro)
//! - Definisce `Config`, la configurazione completa della CLI con validazione
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//!
//! ## Parametri di configurazione (`Config`):
//! - `plugins`: Plugin di ottimizzazione da applicare (default: jpegtran + oxipng)
//! - `cache`: Modalità cache (default: posizione standard)
//! - `bail`: Errori del backend come errori invece che warning (default: false)
//! - `workers`: Limite di concorrenza (default: None = un task per file)
//! - `size_threshold`: Soglia per sostituire file (0.0-1.0, default: 0.9)
//! - `min_size`: Salta file più piccoli di N bytes (default: None)
//! - `output_path`: Directory di output (default: None = replace in place)
//! - `dry_run`: Flag per simulazione senza modifiche (default: false)
//! - `json_output`: Output JSON line-delimited (default: false)
//!
//! ## Esempio:
//! ```rust
//! use media_minify::Config;
//!
//! let config = Config {
//!     bail: true,
//!     workers: Some(8),
//!     ..Default::default()
//! };
//! config.validate().unwrap();
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A single optimization plugin selected by name, with free-form options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub options: serde_json::Value,
}

impl PluginSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: serde_json::Value::Null,
        }
    }

    pub fn with_options(name: impl Into<String>, options: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Read an integer option, if present
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(|v| v.as_u64())
    }
}

/// Configuration handed verbatim to the optimization backend.
///
/// It is also part of the cache fingerprint, so every field must serialize
/// deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,
}

impl OptimizerConfig {
    pub fn with_plugins<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            plugins: names.into_iter().map(PluginSpec::new).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Where (and whether) optimized results are memoized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CacheSetting", into = "CacheSetting")]
pub enum CacheMode {
    Disabled,
    DefaultLocation,
    Explicit(PathBuf),
}

impl Default for CacheMode {
    fn default() -> Self {
        Self::Disabled
    }
}

impl CacheMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Wire form of `CacheMode`: `false`, `true` or a directory string
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CacheSetting {
    Flag(bool),
    Location(PathBuf),
}

impl From<CacheSetting> for CacheMode {
    fn from(setting: CacheSetting) -> Self {
        match setting {
            CacheSetting::Flag(false) => Self::Disabled,
            CacheSetting::Flag(true) => Self::DefaultLocation,
            CacheSetting::Location(path) => Self::Explicit(path),
        }
    }
}

impl From<CacheMode> for CacheSetting {
    fn from(mode: CacheMode) -> Self {
        match mode {
            CacheMode::Disabled => Self::Flag(false),
            CacheMode::DefaultLocation => Self::Flag(true),
            CacheMode::Explicit(path) => Self::Location(path),
        }
    }
}

/// Predicate deciding whether an item goes through the optimizer at all
pub type ItemFilter = Arc<dyn Fn(&[u8], Option<&str>) -> bool + Send + Sync>;

/// Runtime options of a single pipeline run
#[derive(Clone, Default)]
pub struct MinifyOptions {
    pub optimizer: OptimizerConfig,
    pub cache: CacheMode,
    pub bail: bool,
    pub filter: Option<ItemFilter>,
    /// Upper bound on items processed at once (None = unbounded)
    pub workers: Option<usize>,
}

impl MinifyOptions {
    pub fn new(optimizer: OptimizerConfig) -> Self {
        Self {
            optimizer,
            ..Default::default()
        }
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&[u8], Option<&str>) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for MinifyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinifyOptions")
            .field("optimizer", &self.optimizer)
            .field("cache", &self.cache)
            .field("bail", &self.bail)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .field("workers", &self.workers)
            .finish()
    }
}

/// Configuration for the directory minifier (CLI and config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optimization plugins, applied in order to matching formats
    pub plugins: Vec<PluginSpec>,
    /// Result cache: false, true (default location) or a directory
    pub cache: CacheMode,
    /// Report backend failures as errors instead of warnings
    pub bail: bool,
    /// Maximum number of files processed at once (None = all at once)
    pub workers: Option<usize>,
    /// Size threshold (keep if new size < original * threshold)
    pub size_threshold: f64,
    /// Skip files smaller than this many bytes
    pub min_size: Option<u64>,
    /// Output directory for optimized files (None = replace in place)
    pub output_path: Option<PathBuf>,
    /// Dry run - don't actually write files
    pub dry_run: bool,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugins: vec![PluginSpec::new("jpegtran"), PluginSpec::new("oxipng")],
            cache: CacheMode::DefaultLocation,
            bail: false,
            workers: None,
            size_threshold: 0.9,
            min_size: None,
            output_path: None,
            dry_run: false,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.size_threshold <= 0.0 || self.size_threshold > 1.0 {
            return Err(anyhow::anyhow!("Size threshold must be between 0.0 and 1.0"));
        }

        for plugin in &self.plugins {
            if plugin.name.trim().is_empty() {
                return Err(anyhow::anyhow!("Plugin name must not be empty"));
            }
            if let Some(quality) = plugin.option_u64("quality") {
                if quality == 0 || quality > 100 {
                    return Err(anyhow::anyhow!(
                        "Quality for plugin {} must be between 1 and 100",
                        plugin.name
                    ));
                }
            }
        }

        if let Some(ref output_path) = self.output_path {
            if !output_path.exists() {
                return Err(anyhow::anyhow!("Output path does not exist: {}", output_path.display()));
            }
            if !output_path.is_dir() {
                return Err(anyhow::anyhow!("Output path is not a directory: {}", output_path.display()));
            }
        }

        Ok(())
    }

    /// Build the pipeline options, installing the size filter when configured
    pub fn minify_options(&self) -> MinifyOptions {
        let mut options = MinifyOptions {
            optimizer: OptimizerConfig {
                plugins: self.plugins.clone(),
            },
            cache: self.cache.clone(),
            bail: self.bail,
            filter: None,
            workers: self.workers,
        };

        if let Some(min_size) = self.min_size {
            options = options.with_filter(move |input, _path| input.len() as u64 >= min_size);
        }

        options
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
