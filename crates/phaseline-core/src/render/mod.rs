//! Drawing policy.
//!
//! [`layout`] decides *what* each subplot shows: which bars, in which color,
//! at which stacking layer, and which phases get a gate annotation. It does
//! not deal in pixels; [`chart`] draws the resulting [`ChartScene`].

pub mod axis;
pub mod chart;
mod fonts;
pub mod palette;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::record::TimelineSegment;
use crate::timeline::{PhaseCategoryOrder, projects};

pub use axis::XRange;
pub use palette::{Palette, Rgb};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Physical size of the rendered figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FigureSize {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: f64,
}

impl FigureSize {
    pub fn width_px(&self) -> u32 {
        (self.width_in * self.dpi).round().max(1.0) as u32
    }

    pub fn height_px(&self) -> u32 {
        (self.height_in * self.dpi).round().max(1.0) as u32
    }

    pub fn size_px(&self) -> (u32, u32) {
        (self.width_px(), self.height_px())
    }

    /// Convert typographic points to pixels at this figure's dpi.
    pub fn points(&self, pt: f64) -> f64 {
        pt * self.dpi / 72.0
    }
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width_in: 16.0,
            height_in: 9.0,
            dpi: 150.0,
        }
    }
}

/// Everything the renderer needs besides the timeline itself.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Reference date for the today line, the axis window and gate
    /// annotations.
    pub today: NaiveDate,
    pub palette: Palette,
    pub figure: FigureSize,
}

impl RenderConfig {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            palette: Palette::default(),
            figure: FigureSize::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// Stacking order of marks within a subplot, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Layer {
    Spacer,
    TodayLine,
    Grid,
    Bar,
    Label,
    Marker,
}

/// A single drawable element of a subplot. `row` indexes the shared
/// [`PhaseCategoryOrder`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mark {
    /// Transparent bar: no fill, no border.
    Spacer {
        row: usize,
        start: NaiveDate,
        end: NaiveDate,
    },
    TodayLine {
        at: NaiveDate,
    },
    GridLine {
        at: NaiveDate,
    },
    /// Filled bar with an opaque border.
    Bar {
        row: usize,
        start: NaiveDate,
        end: NaiveDate,
        fill: Rgb,
    },
    GateLabel {
        row: usize,
        at: NaiveDate,
        text: String,
    },
    GateMarker {
        row: usize,
        at: NaiveDate,
    },
}

impl Mark {
    pub fn layer(&self) -> Layer {
        match self {
            Mark::Spacer { .. } => Layer::Spacer,
            Mark::TodayLine { .. } => Layer::TodayLine,
            Mark::GridLine { .. } => Layer::Grid,
            Mark::Bar { .. } => Layer::Bar,
            Mark::GateLabel { .. } => Layer::Label,
            Mark::GateMarker { .. } => Layer::Marker,
        }
    }
}

/// One project's panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subplot {
    pub project: String,
    /// Marks sorted by [`Layer`]; draw in sequence.
    pub marks: Vec<Mark>,
}

impl Subplot {
    pub fn marks_in(&self, layer: Layer) -> impl Iterator<Item = &Mark> {
        self.marks.iter().filter(move |m| m.layer() == layer)
    }
}

/// A fully laid-out chart: shared axes plus one subplot per project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartScene {
    pub today: NaiveDate,
    pub x_range: XRange,
    /// Quarter-start tick dates within `x_range`.
    pub ticks: Vec<NaiveDate>,
    /// Row labels, identical for every subplot.
    pub categories: Vec<String>,
    pub subplots: Vec<Subplot>,
    pub figure: FigureSize,
}

/// Errors raised while producing or writing the chart artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to draw chart: {0}")]
    Draw(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Whether a visible bar ending on `end` is annotated with its gate.
///
/// Only phases still pending or in flight (ending strictly after today) are
/// flagged. Gate presence plays no part.
pub fn needs_gate_annotation(end: NaiveDate, today: NaiveDate) -> bool {
    end > today
}

/// Annotation text for a gate. An absent gate renders as an empty name.
pub fn gate_label(gate: Option<&str>) -> String {
    format!(" | {}", gate.unwrap_or_default())
}

/// Lay out one subplot per project found in `segments`, in order of first
/// appearance, sharing `order` as the row axis.
pub fn layout(
    order: &PhaseCategoryOrder,
    segments: &[TimelineSegment],
    config: &RenderConfig,
) -> ChartScene {
    let today = config.today;
    let x_range = XRange::for_chart(today, segments.iter().map(|s| s.end).max());
    let ticks = axis::quarter_ticks(&x_range);

    let mut fallback_phases = BTreeSet::new();
    let subplots: Vec<Subplot> = projects(segments)
        .into_iter()
        .map(|project| {
            let mut marks = vec![Mark::TodayLine { at: today }];
            marks.extend(ticks.iter().map(|&at| Mark::GridLine { at }));

            for seg in segments.iter().filter(|s| s.project == project) {
                let Some(row) = order.position(&seg.phase) else {
                    warn!(project = %seg.project, phase = %seg.phase, "phase missing from category order, skipping");
                    continue;
                };
                if !seg.visible {
                    marks.push(Mark::Spacer {
                        row,
                        start: seg.start,
                        end: seg.end,
                    });
                    continue;
                }
                if config.palette.lookup(&seg.phase).is_none() {
                    fallback_phases.insert(seg.phase.clone());
                }
                marks.push(Mark::Bar {
                    row,
                    start: seg.start,
                    end: seg.end,
                    fill: config.palette.get(&seg.phase),
                });
                if needs_gate_annotation(seg.end, today) {
                    marks.push(Mark::GateLabel {
                        row,
                        at: seg.end,
                        text: gate_label(seg.gate.as_deref()),
                    });
                    marks.push(Mark::GateMarker { row, at: seg.end });
                }
            }

            marks.sort_by_key(Mark::layer);
            Subplot {
                project: project.to_string(),
                marks,
            }
        })
        .collect();

    for phase in &fallback_phases {
        warn!(phase = %phase, fallback = %config.palette.fallback(), "no palette color for phase, using fallback");
    }
    debug!(
        subplots = subplots.len(),
        rows = order.len(),
        ticks = ticks.len(),
        "laid out chart"
    );

    ChartScene {
        today,
        x_range,
        ticks,
        categories: order.as_slice().to_vec(),
        subplots,
        figure: config.figure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn seg(phase: &str, start: &str, end: &str, gate: Option<&str>, visible: bool) -> TimelineSegment {
        TimelineSegment {
            project: "P1".into(),
            phase: phase.into(),
            start: d(start),
            end: d(end),
            gate: gate.map(str::to_owned),
            visible,
        }
    }

    #[test]
    fn gate_annotation_is_strictly_after_today() {
        let today = d("2024-06-01");
        assert!(needs_gate_annotation(d("2024-06-02"), today));
        assert!(!needs_gate_annotation(d("2024-06-01"), today));
        assert!(!needs_gate_annotation(d("2024-05-31"), today));
    }

    #[test]
    fn gate_label_renders_placeholder_for_absent_gate() {
        assert_eq!(gate_label(Some("G2")), " | G2");
        assert_eq!(gate_label(None), " | ");
    }

    #[test]
    fn marks_are_sorted_by_layer() {
        let order = PhaseCategoryOrder::from_phases(["Build", "Design"]);
        let segments = vec![
            seg("Build", "2024-02-15", "2024-09-01", Some("G2"), true),
            seg("Build", "2024-01-01", "2024-02-15", None, false),
            seg("Design", "2024-01-01", "2024-02-01", Some("G1"), true),
        ];
        let scene = layout(&order, &segments, &RenderConfig::new(d("2024-06-01")));
        let layers: Vec<Layer> = scene.subplots[0].marks.iter().map(Mark::layer).collect();
        let mut sorted = layers.clone();
        sorted.sort();
        assert_eq!(layers, sorted);
        assert_eq!(layers.first(), Some(&Layer::Spacer));
        assert_eq!(layers.last(), Some(&Layer::Marker));
    }

    #[test]
    fn scene_categories_match_order() {
        let order = PhaseCategoryOrder::from_phases(["B", "A"]);
        let segments = vec![seg("A", "2024-01-01", "2024-02-01", None, true)];
        let scene = layout(&order, &segments, &RenderConfig::new(d("2024-06-01")));
        assert_eq!(scene.categories, ["A", "B"]);
    }

    #[test]
    fn figure_size_in_pixels() {
        let figure = FigureSize::default();
        assert_eq!(figure.width_px(), 2400);
        assert_eq!(figure.height_px(), 1350);
        assert!((figure.points(72.0) - 150.0).abs() < f64::EPSILON);
    }
}
