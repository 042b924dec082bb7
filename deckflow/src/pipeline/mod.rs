//! Pipeline building and execution.
//!
//! This module provides:
//! - Stage specifications
//! - Pipeline builder with validation
//! - The fail-fast sequential runner
//! - Run reports

mod builder;
mod report;
mod runner;
mod spec;

pub use builder::PipelineBuilder;
pub use report::{PipelineReport, StageRecord};
pub use runner::Pipeline;
pub use spec::StageSpec;

/// The reserved target that runs every stage in declared order.
pub const ALL_TARGET: &str = "all";
