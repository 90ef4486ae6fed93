//! Artifact export: draw the chart and write it atomically.
//!
//! The chart is drawn into a temporary file in the destination directory
//! and then renamed into place, so a failed run never leaves a truncated
//! image behind and never disturbs an existing artifact.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::render::chart::{Theme, render_png, render_svg};
use crate::render::{ChartScene, RenderError};

/// Default file name prefix of the artifact.
pub const DEFAULT_PREFIX: &str = "projects_timeline";

/// Image encoding of the artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!("unknown output format {other:?} (expected png or svg)")),
        }
    }
}

/// Where and how to write the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub dir: PathBuf,
    pub prefix: String,
    pub format: OutputFormat,
}

impl ExportOptions {
    /// Path of the artifact for `date`: `{dir}/{prefix}_{YYYY-MM-DD}.{ext}`.
    pub fn artifact_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(artifact_file_name(&self.prefix, date, self.format))
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            prefix: DEFAULT_PREFIX.to_string(),
            format: OutputFormat::Png,
        }
    }
}

pub fn artifact_file_name(prefix: &str, date: NaiveDate, format: OutputFormat) -> String {
    format!("{prefix}_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Draw `scene` and write it to the dated artifact path for `run_date`.
///
/// Returns the path written. An existing artifact for the same date is
/// replaced only once the new one is complete.
pub fn export(
    scene: &ChartScene,
    theme: &Theme,
    options: &ExportOptions,
    run_date: NaiveDate,
) -> Result<PathBuf, RenderError> {
    let path = options.artifact_path(run_date);
    match options.format {
        OutputFormat::Svg => {
            let svg = render_svg(scene, theme)?;
            write_atomic(&path, |tmp| {
                std::fs::write(tmp, svg.as_bytes()).map_err(|source| RenderError::Io {
                    path: tmp.display().to_string(),
                    source,
                })
            })?;
        }
        OutputFormat::Png => write_atomic(&path, |tmp| render_png(scene, theme, tmp))?,
    }
    info!(path = %path.display(), format = %options.format, subplots = scene.subplots.len(), "wrote chart");
    Ok(path)
}

/// Produce `path` by letting `render` fill a temporary sibling file, then
/// renaming it into place. The parent directory is created if needed.
///
/// The temporary file keeps `path`'s extension so encoders that pick a
/// format from the file name see the right one. If `render` or the rename
/// fails, the temporary file is removed and `path` is left untouched.
pub fn write_atomic<F>(path: &Path, render: F) -> Result<(), RenderError>
where
    F: FnOnce(&Path) -> Result<(), RenderError>,
{
    let io_err = |source: std::io::Error| RenderError::Io {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let suffix = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let tmp = tempfile::Builder::new()
        .prefix(".phaseline-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(io_err)?;

    render(tmp.path())?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
