//! Core of the phaseline timeline renderer.
//!
//! The pipeline is strictly linear:
//!
//! 1. [`source`] loads [`PhaseRecord`]s from a CSV, Excel or TOML file.
//! 2. [`timeline::build`] turns the records into visible and spacer
//!    [`TimelineSegment`]s plus the shared [`PhaseCategoryOrder`].
//! 3. [`render::layout`] applies the drawing policy and produces a
//!    [`render::ChartScene`].
//! 4. [`export`] draws the scene as SVG or PNG and atomically writes the
//!    artifact.

pub mod export;
pub mod record;
pub mod render;
pub mod source;
pub mod timeline;

pub use record::{PhaseRecord, TimelineSegment};
pub use timeline::{BuildError, PhaseCategoryOrder, Timeline, build};
