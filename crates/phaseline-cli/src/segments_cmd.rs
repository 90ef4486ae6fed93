//! `phaseline segments`: print the builder output without rendering.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use phaseline_core::{PhaseCategoryOrder, TimelineSegment, build, source};

use crate::config::PhaselineConfig;

#[derive(Serialize)]
struct SegmentsReport<'a> {
    order: &'a PhaseCategoryOrder,
    segments: &'a [TimelineSegment],
}

/// Run the segments command, writing to stdout.
pub fn run_segments(config: &PhaselineConfig, json: bool) -> Result<()> {
    let records = source::load_records(&config.input)
        .with_context(|| format!("failed to load records from {}", config.input.display()))?;
    let mut timeline = build(&records).context("failed to build timeline")?;
    // Stable output: project, then phase, visible bars before their spacers.
    timeline.segments.sort_by(|a, b| {
        (&a.project, &a.phase, !a.visible, a.start).cmp(&(&b.project, &b.phase, !b.visible, b.start))
    });

    let mut out = std::io::stdout().lock();
    if json {
        let report = SegmentsReport {
            order: &timeline.order,
            segments: &timeline.segments,
        };
        serde_json::to_writer_pretty(&mut out, &report).context("failed to serialize segments")?;
        writeln!(out)?;
        return Ok(());
    }

    write_table(&mut out, &timeline.order, &timeline.segments)
}

fn write_table(
    out: &mut impl Write,
    order: &PhaseCategoryOrder,
    segments: &[TimelineSegment],
) -> Result<()> {
    let phases: Vec<&str> = order.iter().collect();
    writeln!(out, "Phases: {}", phases.join(", "))?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<24} {:<20} {:<10} {:<10} {:>6} {:<8} {}",
        "PROJECT", "PHASE", "START", "END", "DAYS", "KIND", "GATE"
    )?;
    writeln!(out, "{}", "-".repeat(90))?;

    for seg in segments {
        let project = truncate(&seg.project, 24);
        let phase = truncate(&seg.phase, 20);
        writeln!(
            out,
            "{:<24} {:<20} {:<10} {:<10} {:>6} {:<8} {}",
            project,
            phase,
            seg.start,
            seg.end,
            seg.duration_days(),
            if seg.visible { "bar" } else { "spacer" },
            seg.gate.as_deref().unwrap_or("-")
        )?;
    }

    let spacers = segments.iter().filter(|s| s.is_spacer()).count();
    writeln!(out)?;
    writeln!(
        out,
        "{} segments ({} bars, {} spacers)",
        segments.len(),
        segments.len() - spacers,
        spacers
    )?;
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn table_lists_bars_and_spacers() {
        let records = vec![
            phaseline_core::PhaseRecord::new("P1", "Design", d("2024-01-01"), d("2024-02-01"))
                .gate("G1"),
            phaseline_core::PhaseRecord::new("P1", "Build", d("2024-02-15"), d("2024-03-01")),
        ];
        let timeline = build(&records).unwrap();
        let mut buf = Vec::new();
        write_table(&mut buf, &timeline.order, &timeline.segments).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("Phases: Build, Design\n"), "{text}");
        assert!(text.contains("spacer"));
        assert!(text.contains("G1"));
        assert!(text.contains("3 segments (2 bars, 1 spacers)"), "{text}");
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long project name", 10), "a very ...");
    }
}
