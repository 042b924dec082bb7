//! # Deckflow
//!
//! A fixed-order, fail-fast stage pipeline for building a slide deck:
//! render the source to HTML, publish the working directory to a remote
//! host, and clean up generated output.
//!
//! - **Fixed order**: stages run in the order they were declared, one at a time
//! - **Fail-fast**: the first failing stage stops the run; nothing is rolled back
//! - **Explicit context**: stages receive the working directory, destination
//!   and template variables through a [`context::RunContext`]
//! - **Observable**: every transition is reported to an [`events::EventSink`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use deckflow::prelude::*;
//!
//! let pipeline = PipelineBuilder::new("deck")
//!     .spec(StageSpec::new("render", Arc::new(CommandStage::new("render", "pandoc", ["-s", "-o", "slides.html", "slides.md"]))).with_alias("deck"))?
//!     .spec(StageSpec::new("cleanup", Arc::new(RemoveStage::new("cleanup", ["*.html"]))).with_alias("clean"))?
//!     .build()?;
//!
//! let report = pipeline.run("all", &RunContext::new(".")).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Overrides, PipelineConfig, StageConfig};
    pub use crate::context::{RunContext, RunIdentity};
    pub use crate::core::{PipelineEvent, StageOutput, StageStatus};
    pub use crate::errors::{
        ConfigError, DeckflowError, PipelineValidationError, StageExecutionError,
        UnknownTargetError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{
        Pipeline, PipelineBuilder, PipelineReport, StageRecord, StageSpec, ALL_TARGET,
    };
    pub use crate::stages::{CommandStage, FnStage, NoOpStage, RemoveStage, Stage};
    pub use std::sync::Arc;
}
