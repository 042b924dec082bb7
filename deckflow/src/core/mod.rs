//! Core domain model types for deckflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage status enum
//! - Stage output type with factory methods
//! - Pipeline lifecycle events

mod event;
mod output;
mod status;

pub use event::PipelineEvent;
pub use output::StageOutput;
pub use status::StageStatus;
