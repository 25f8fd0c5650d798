//! # Media Minify - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione (file + override da CLI)
//! - Avvio del `DirectoryMinifier`
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` se presente)
//! 3. Carica il file di configurazione, se indicato, e applica gli override
//! 4. Esegue la run; con `--bail` esce con errore se almeno un file è fallito
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-minify /path/to/media --plugin mozjpeg --plugin oxipng --quality 75 --workers 8
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use media_minify::{json_output::JsonMessage, CacheMode, Config, DirectoryMinifier, PluginSpec};

#[derive(Parser)]
#[command(name = "media-minify")]
#[command(about = "Minify images in place or into an output directory, with result caching")]
struct Args {
    /// Directory containing images to minify
    media_directory: PathBuf,

    /// Optimization plugin to apply (repeatable): mozjpeg, jpegtran, jpegoptim, oxipng, optipng, pngcrush
    #[arg(short, long = "plugin")]
    plugins: Vec<String>,

    /// Lossy quality for JPEG plugins (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Cache directory (default: user cache directory)
    #[arg(long, conflicts_with = "no_cache")]
    cache_dir: Option<PathBuf>,

    /// Disable the result cache
    #[arg(long)]
    no_cache: bool,

    /// Report optimization failures as errors and exit non-zero
    #[arg(long)]
    bail: bool,

    /// Number of files processed at once (default: all)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Size threshold (keep if new size < original * threshold)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Skip files smaller than this many bytes
    #[arg(long)]
    min_size: Option<u64>,

    /// Output directory for minified files (if not specified, replace originals in place)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dry run - don't actually write files
    #[arg(long)]
    dry_run: bool,

    /// Output progress and status as JSON lines
    #[arg(long)]
    json: bool,

    /// JSON configuration file; command line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Applica gli override della CLI sopra la configurazione caricata
    fn apply_to(&self, mut config: Config) -> Config {
        if !self.plugins.is_empty() {
            config.plugins = self.plugins.iter().map(PluginSpec::new).collect();
        }

        if let Some(quality) = self.quality {
            for plugin in &mut config.plugins {
                if let Some(options) = plugin.options.as_object_mut() {
                    options.insert("quality".to_string(), serde_json::json!(quality));
                } else {
                    plugin.options = serde_json::json!({ "quality": quality });
                }
            }
        }

        if self.no_cache {
            config.cache = CacheMode::Disabled;
        } else if let Some(ref dir) = self.cache_dir {
            config.cache = CacheMode::Explicit(dir.clone());
        }

        config.bail |= self.bail;
        config.dry_run |= self.dry_run;
        config.json_output |= self.json;
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if let Some(threshold) = self.threshold {
            config.size_threshold = threshold;
        }
        if self.min_size.is_some() {
            config.min_size = self.min_size;
        }
        if self.output.is_some() {
            config.output_path = self.output.clone();
        }

        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args).await {
        if args.json {
            JsonMessage::error(e.to_string(), e.chain().nth(1).map(|s| s.to_string())).emit();
        }
        return Err(e);
    }

    Ok(())
}

async fn run(args: &Args) -> Result<()> {
    if !args.media_directory.exists() {
        return Err(anyhow::anyhow!("Media directory does not exist: {}", args.media_directory.display()));
    }

    let base = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    let config = args.apply_to(base);

    // Create output directory if specified
    if let Some(ref output_dir) = config.output_path {
        if !output_dir.exists() {
            tokio::fs::create_dir_all(output_dir).await?;
            info!("Created output directory: {}", output_dir.display());
        }
    }

    let bail = config.bail;
    let minifier = DirectoryMinifier::new(&args.media_directory, config)?;
    let stats = minifier.run().await?;

    if bail && stats.errors > 0 {
        return Err(anyhow::anyhow!("{} file(s) failed to minify", stats.errors));
    }

    Ok(())
}
