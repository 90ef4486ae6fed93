//! Input records and the segments derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the input table: a single phase of a single project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseRecord {
    /// Project the phase belongs to.
    pub project: String,
    /// Phase name, used as the row category on every subplot.
    pub phase: String,
    /// First day of the phase.
    pub start: NaiveDate,
    /// Last day of the phase. Must not precede `start`.
    pub end: NaiveDate,
    /// Milestone label reached when the phase completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,
}

impl PhaseRecord {
    pub fn new(
        project: impl Into<String>,
        phase: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            project: project.into(),
            phase: phase.into(),
            start,
            end,
            gate: None,
        }
    }

    /// Set the gate label.
    pub fn gate(mut self, gate: impl Into<String>) -> Self {
        self.gate = Some(gate.into());
        self
    }

    /// Whether the interval is well formed (`start <= end`).
    pub fn is_valid_interval(&self) -> bool {
        self.start <= self.end
    }
}

/// A bar to be laid out on a project's subplot.
///
/// Visible segments mirror an input record one-to-one. Spacer segments are
/// transparent bars running from the project's earliest start to a phase's
/// own start; they never carry a gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub project: String,
    pub phase: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,
    pub visible: bool,
}

impl TimelineSegment {
    /// The visible bar for `record`, with dates and gate copied verbatim.
    pub fn visible(record: &PhaseRecord) -> Self {
        Self {
            project: record.project.clone(),
            phase: record.phase.clone(),
            start: record.start,
            end: record.end,
            gate: record.gate.clone(),
            visible: true,
        }
    }

    /// A transparent bar from `anchor` up to the record's start.
    pub fn spacer(record: &PhaseRecord, anchor: NaiveDate) -> Self {
        Self {
            project: record.project.clone(),
            phase: record.phase.clone(),
            start: anchor,
            end: record.start,
            gate: None,
            visible: false,
        }
    }

    pub fn is_spacer(&self) -> bool {
        !self.visible
    }

    /// Length of the bar in whole days (zero for a single-day phase).
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}
