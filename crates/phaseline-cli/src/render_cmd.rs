//! `phaseline render`: load, build, lay out, and export one chart.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use phaseline_core::render::chart::Theme;
use phaseline_core::render::{RenderConfig, layout};
use phaseline_core::{build, export, source};

use crate::config::PhaselineConfig;

/// Run one render pass. `today` drives the chart policy and names the
/// artifact. Returns the artifact path.
pub fn run_render(config: &PhaselineConfig, today: NaiveDate) -> Result<PathBuf> {
    let records = source::load_records(&config.input)
        .with_context(|| format!("failed to load records from {}", config.input.display()))?;
    info!(records = records.len(), input = %config.input.display(), "loaded input");

    let timeline = build(&records).context("failed to build timeline")?;

    let render_config = RenderConfig {
        today,
        palette: config.palette.clone(),
        figure: config.figure,
    };
    let scene = layout(&timeline.order, &timeline.segments, &render_config);
    if scene.subplots.is_empty() {
        info!("no records, writing an empty chart");
    }

    let path = export::export(&scene, &Theme::default(), &config.export, today)
        .context("failed to write chart")?;
    Ok(path)
}
