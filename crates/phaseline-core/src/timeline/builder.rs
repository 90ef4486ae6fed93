//! Segment generation.
//!
//! Groups records by project, anchors every phase of a project to the
//! project's earliest start with a transparent spacer, and derives the shared
//! phase axis. Validation runs over the whole input before any segment is
//! produced, so a single bad interval aborts the build.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use super::order::PhaseCategoryOrder;
use crate::record::{PhaseRecord, TimelineSegment};

/// Errors that can occur while building a timeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error(
        "invalid interval for project {project:?}, phase {phase:?} (record {index}): start {start} is after end {end}"
    )]
    InvalidInterval {
        /// Zero-based position of the record in the input.
        index: usize,
        project: String,
        phase: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Output of [`build`]: the shared phase axis and every segment to draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    pub order: PhaseCategoryOrder,
    /// Visible and spacer segments. Order carries no meaning.
    pub segments: Vec<TimelineSegment>,
}

impl Timeline {
    pub fn into_parts(self) -> (PhaseCategoryOrder, Vec<TimelineSegment>) {
        (self.order, self.segments)
    }

    pub fn visible(&self) -> impl Iterator<Item = &TimelineSegment> {
        self.segments.iter().filter(|s| s.visible)
    }

    pub fn spacers(&self) -> impl Iterator<Item = &TimelineSegment> {
        self.segments.iter().filter(|s| s.is_spacer())
    }
}

/// Distinct projects in order of first appearance in `segments`.
pub fn projects(segments: &[TimelineSegment]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for seg in segments {
        if !seen.contains(&seg.project.as_str()) {
            seen.push(&seg.project);
        }
    }
    seen
}

/// Build the timeline for `records`.
///
/// An empty input yields an empty timeline. Any record whose start is after
/// its end fails the whole build with [`BuildError::InvalidInterval`].
pub fn build(records: &[PhaseRecord]) -> Result<Timeline, BuildError> {
    validate(records)?;

    let groups = group_by_project(records);
    let min_starts = min_starts_of(&groups);

    let mut segments = Vec::with_capacity(records.len() * 2);
    for (project, group) in &groups {
        // Groups are never empty, so every project has a minimum.
        let Some(&anchor) = min_starts.get(project) else {
            continue;
        };
        for record in group {
            segments.push(TimelineSegment::visible(record));
            if record.start > anchor {
                segments.push(TimelineSegment::spacer(record, anchor));
            }
        }
    }

    let order = PhaseCategoryOrder::from_phases(records.iter().map(|r| r.phase.as_str()));

    debug!(
        records = records.len(),
        projects = groups.len(),
        phases = order.len(),
        segments = segments.len(),
        "built timeline"
    );

    Ok(Timeline { order, segments })
}

/// Earliest start date of each project.
pub fn project_min_starts(records: &[PhaseRecord]) -> BTreeMap<&str, NaiveDate> {
    min_starts_of(&group_by_project(records))
}

fn validate(records: &[PhaseRecord]) -> Result<(), BuildError> {
    match records
        .iter()
        .enumerate()
        .find(|(_, r)| !r.is_valid_interval())
    {
        Some((index, r)) => Err(BuildError::InvalidInterval {
            index,
            project: r.project.clone(),
            phase: r.phase.clone(),
            start: r.start,
            end: r.end,
        }),
        None => Ok(()),
    }
}

fn group_by_project(records: &[PhaseRecord]) -> BTreeMap<&str, Vec<&PhaseRecord>> {
    let mut groups: BTreeMap<&str, Vec<&PhaseRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.project.as_str()).or_default().push(record);
    }
    groups
}

fn min_starts_of<'a>(
    groups: &BTreeMap<&'a str, Vec<&PhaseRecord>>,
) -> BTreeMap<&'a str, NaiveDate> {
    groups
        .iter()
        .filter_map(|(project, group)| {
            group
                .iter()
                .map(|r| r.start)
                .min()
                .map(|min| (*project, min))
        })
        .collect()
}
