//! Timeline building: records in, segments and the shared phase axis out.

pub mod builder;
pub mod order;

pub use builder::{BuildError, Timeline, build, project_min_starts, projects};
pub use order::PhaseCategoryOrder;
