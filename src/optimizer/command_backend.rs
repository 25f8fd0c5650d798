//! # Command Backend Module
//!
//! Backend di riferimento che delega l'ottimizzazione a tool esterni.
//!
//! ## Plugin supportati
//!
//! | Plugin    | Formato | Tool       | Opzioni            |
//! |-----------|---------|------------|--------------------|
//! | mozjpeg   | JPEG    | cjpeg      | `quality` (1-100)  |
//! | jpegtran  | JPEG    | jpegtran   | -                  |
//! | jpegoptim | JPEG    | jpegoptim  | `quality` (1-100)  |
//! | oxipng    | PNG     | oxipng     | `level` (0-6)      |
//! | optipng   | PNG     | optipng    | `level` (0-7)      |
//! | pngcrush  | PNG     | pngcrush   | -                  |
//!
//! ## Pipeline
//!
//! 1. **Rilevamento formato**: magic bytes tramite `image::guess_format`
//! 2. **Selezione plugin**: solo i plugin del formato rilevato vengono eseguiti, in ordine
//! 3. **Esecuzione**: input scritto in una directory temporanea, tool lanciato con
//!    `tokio::process::Command`, output letto da file o da stdout
//! 4. **Esito**: nessun plugin applicabile = `Outcome::Unchanged`;
//!    exit code non zero = errore con lo stderr del tool (es. "Corrupt JPEG data")
//!
//! I nomi di plugin sconosciuti vengono ignorati con un warning; se non ne resta
//! nessuno il backend segnala `NoBackendConfigured`.

use crate::config::{OptimizerConfig, PluginSpec};
use crate::error::MinifyError;
use crate::optimizer::backend::{Optimizer, Outcome};
use crate::tool_resolver::ToolResolver;
use async_trait::async_trait;
use image::ImageFormat;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

/// Where a tool leaves its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    File,
    Stdout,
}

/// Built-in tool invocations, selected by plugin name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPreset {
    Mozjpeg,
    Jpegtran,
    Jpegoptim,
    Oxipng,
    Optipng,
    Pngcrush,
}

impl ToolPreset {
    pub const ALL: [ToolPreset; 6] = [
        Self::Mozjpeg,
        Self::Jpegtran,
        Self::Jpegoptim,
        Self::Oxipng,
        Self::Optipng,
        Self::Pngcrush,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "mozjpeg" => Some(Self::Mozjpeg),
            "jpegtran" => Some(Self::Jpegtran),
            "jpegoptim" => Some(Self::Jpegoptim),
            "oxipng" => Some(Self::Oxipng),
            "optipng" => Some(Self::Optipng),
            "pngcrush" => Some(Self::Pngcrush),
            _ => None,
        }
    }

    /// Executable name
    pub fn tool(&self) -> &'static str {
        match self {
            Self::Mozjpeg => "cjpeg",
            Self::Jpegtran => "jpegtran",
            Self::Jpegoptim => "jpegoptim",
            Self::Oxipng => "oxipng",
            Self::Optipng => "optipng",
            Self::Pngcrush => "pngcrush",
        }
    }

    /// Image format the tool accepts
    pub fn format(&self) -> ImageFormat {
        match self {
            Self::Mozjpeg | Self::Jpegtran | Self::Jpegoptim => ImageFormat::Jpeg,
            Self::Oxipng | Self::Optipng | Self::Pngcrush => ImageFormat::Png,
        }
    }

    fn output_mode(&self) -> OutputMode {
        match self {
            Self::Jpegoptim => OutputMode::Stdout,
            _ => OutputMode::File,
        }
    }

    fn args(&self, spec: &PluginSpec, input: &str, output: &str) -> Vec<String> {
        let quality = spec.option_u64("quality").unwrap_or(80).to_string();
        match self {
            Self::Mozjpeg => to_string_vec([
                "-quality",
                quality.as_str(),
                "-optimize",
                "-progressive",
                "-outfile",
                output,
                input,
            ]),
            Self::Jpegtran => to_string_vec([
                "-optimize",
                "-progressive",
                "-copy",
                "none",
                "-outfile",
                output,
                input,
            ]),
            Self::Jpegoptim => to_string_vec([
                format!("--max={}", quality).as_str(),
                "--strip-all",
                "--stdout",
                input,
            ]),
            Self::Oxipng => {
                let level = spec.option_u64("level").unwrap_or(2).min(6).to_string();
                to_string_vec([
                    "-q",
                    "-o",
                    level.as_str(),
                    "--strip",
                    "safe",
                    "--out",
                    output,
                    input,
                ])
            }
            Self::Optipng => {
                let level = format!("-o{}", spec.option_u64("level").unwrap_or(2).min(7));
                to_string_vec([
                    "-quiet",
                    level.as_str(),
                    "-strip",
                    "all",
                    "-out",
                    output,
                    input,
                ])
            }
            Self::Pngcrush => to_string_vec(["-q", input, output]),
        }
    }
}

fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        _ => "bin",
    }
}

/// Optimizer backed by external command-line tools
#[derive(Debug, Clone, Default)]
pub struct CommandOptimizer {
    resolver: ToolResolver,
}

impl CommandOptimizer {
    pub fn new() -> Self {
        Self {
            resolver: ToolResolver::new(),
        }
    }

    pub fn with_resolver(resolver: ToolResolver) -> Self {
        Self { resolver }
    }

    /// Resolve plugin specs into presets, dropping unknown names
    pub fn resolve_plugins<'a>(config: &'a OptimizerConfig) -> Vec<(ToolPreset, &'a PluginSpec)> {
        config
            .plugins
            .iter()
            .filter_map(|spec| match ToolPreset::from_name(&spec.name) {
                Some(preset) => Some((preset, spec)),
                None => {
                    warn!("Unknown optimization plugin ignored: {}", spec.name);
                    None
                }
            })
            .collect()
    }

    /// Names of the preset tools installed on this system
    pub fn available_tools(&self) -> Vec<String> {
        let names: Vec<&str> = ToolPreset::ALL.iter().map(|p| p.tool()).collect();
        self.resolver.available_tools(&names)
    }

    async fn run_plugin(
        &self,
        preset: ToolPreset,
        spec: &PluginSpec,
        input: &[u8],
    ) -> Result<Vec<u8>, MinifyError> {
        let tool_path = self
            .resolver
            .resolve_tool(preset.tool())
            .ok_or_else(|| MinifyError::MissingDependency(preset.tool().to_string()))?;

        let work_dir = tempfile::TempDir::new()?;
        let extension = extension_for(preset.format());
        let input_path = work_dir.path().join(format!("input.{}", extension));
        let output_path = work_dir.path().join(format!("output.{}", extension));
        tokio::fs::write(&input_path, input).await?;

        let args = preset.args(
            spec,
            &input_path.to_string_lossy(),
            &output_path.to_string_lossy(),
        );
        debug!("Running {:?} {:?}", tool_path, args);

        let start_time = Instant::now();
        let result = Command::new(&tool_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await?;
        let elapsed = start_time.elapsed();

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            warn!("{} failed after {:?}: {}", preset.tool(), elapsed, stderr);
            return Err(MinifyError::Optimization(if stderr.is_empty() {
                format!("{} exited with {}", preset.tool(), result.status)
            } else {
                format!("{}: {}", preset.tool(), stderr)
            }));
        }

        let output = match preset.output_mode() {
            OutputMode::Stdout => result.stdout,
            OutputMode::File => tokio::fs::read(&output_path).await?,
        };

        debug!(
            "{} completed in {:?}: {} -> {} bytes",
            preset.tool(),
            elapsed,
            input.len(),
            output.len()
        );
        Ok(output)
    }
}

#[async_trait]
impl Optimizer for CommandOptimizer {
    async fn optimize(
        &self,
        input: &[u8],
        config: &OptimizerConfig,
    ) -> Result<Outcome, MinifyError> {
        let plugins = Self::resolve_plugins(config);
        if plugins.is_empty() {
            return Err(MinifyError::NoBackendConfigured);
        }

        let Ok(format) = image::guess_format(input) else {
            debug!("Unrecognized content ({} bytes), leaving unchanged", input.len());
            return Ok(Outcome::Unchanged);
        };

        let mut current: Option<Vec<u8>> = None;
        for (preset, spec) in plugins.into_iter().filter(|(p, _)| p.format() == format) {
            let source = current.as_deref().unwrap_or(input);
            let optimized = self.run_plugin(preset, spec, source).await?;
            current = Some(optimized);
        }

        Ok(match current {
            Some(bytes) => Outcome::Optimized(bytes),
            None => {
                debug!("No plugin configured for {:?}, leaving unchanged", format);
                Outcome::Unchanged
            }
        })
    }
}
