//! Configuration file management for phaseline.
//!
//! Provides a TOML-based config file at `~/.config/phaseline/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use phaseline_core::export::{DEFAULT_PREFIX, ExportOptions, OutputFormat};
use phaseline_core::render::{FigureSize, Palette, Rgb};

/// Input file used when nothing else is configured.
pub const DEFAULT_INPUT: &str = "project_tasks.csv";
/// Output directory used when nothing else is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

pub const INPUT_ENV: &str = "PHASELINE_INPUT";
pub const OUTPUT_DIR_ENV: &str = "PHASELINE_OUTPUT_DIR";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub chart: ChartSection,
    /// Phase name to `#rrggbb` color. Entries override the stock palette.
    #[serde(default)]
    pub palette: BTreeMap<String, Rgb>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct InputSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<f64>,
    /// Color for phases missing from the palette.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_color: Option<Rgb>,
}

impl ConfigFile {
    /// A config file spelling out every built-in default.
    pub fn with_defaults() -> Self {
        let figure = FigureSize::default();
        let palette = Palette::default();
        Self {
            input: InputSection {
                path: Some(PathBuf::from(DEFAULT_INPUT)),
            },
            output: OutputSection {
                dir: Some(PathBuf::from(DEFAULT_OUTPUT_DIR)),
                prefix: Some(DEFAULT_PREFIX.to_string()),
                format: Some(OutputFormat::Png),
            },
            chart: ChartSection {
                width_in: Some(figure.width_in),
                height_in: Some(figure.height_in),
                dpi: Some(figure.dpi),
                fallback_color: Some(palette.fallback()),
            },
            palette: palette
                .iter()
                .map(|(phase, color)| (phase.to_string(), color))
                .collect(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the phaseline config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/phaseline` or
/// `~/.config/phaseline`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("phaseline");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("phaseline")
}

/// Return the default path of the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
///
/// A missing file is not an error (`Ok(None)`); an unreadable or malformed
/// one is.
pub fn load_config(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line. `None` defers to the next link of the
/// resolution chain.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PhaselineConfig {
    pub input: PathBuf,
    pub export: ExportOptions,
    pub figure: FigureSize,
    pub palette: Palette,
}

impl PhaselineConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Input: `--input` > `PHASELINE_INPUT` > `input.path` > `project_tasks.csv`
    /// - Output dir: `--output-dir` > `PHASELINE_OUTPUT_DIR` > `output.dir` > `output`
    /// - Format: `--format` > `output.format` > PNG
    /// - Prefix, figure size and palette come from the config file or defaults.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let path = cli.config.clone().unwrap_or_else(config_path);
        let file = match load_config(&path)? {
            Some(file) => file,
            None if cli.config.is_some() => {
                anyhow::bail!("config file not found at {}", path.display())
            }
            None => ConfigFile::default(),
        };
        Ok(Self::from_layers(cli, &file))
    }

    fn from_layers(cli: &CliOverrides, file: &ConfigFile) -> Self {
        let input = cli
            .input
            .clone()
            .or_else(|| env_path(INPUT_ENV))
            .or_else(|| file.input.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));

        let defaults = ExportOptions::default();
        let export = ExportOptions {
            dir: cli
                .output_dir
                .clone()
                .or_else(|| env_path(OUTPUT_DIR_ENV))
                .or_else(|| file.output.dir.clone())
                .unwrap_or(defaults.dir),
            prefix: file.output.prefix.clone().unwrap_or(defaults.prefix),
            format: cli.format.or(file.output.format).unwrap_or(defaults.format),
        };

        let stock = FigureSize::default();
        let figure = FigureSize {
            width_in: file.chart.width_in.unwrap_or(stock.width_in),
            height_in: file.chart.height_in.unwrap_or(stock.height_in),
            dpi: file.chart.dpi.unwrap_or(stock.dpi),
        };

        let mut palette = Palette::default();
        for (phase, color) in &file.palette {
            palette.insert(phase.clone(), *color);
        }
        if let Some(fallback) = file.chart.fallback_color {
            palette.set_fallback(fallback);
        }

        Self {
            input,
            export,
            figure,
            palette,
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
