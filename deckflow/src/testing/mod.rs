//! Testing utilities for deckflow pipelines.
//!
//! This module provides stage doubles that record execution order into a
//! shared [`ExecutionLog`], so tests can assert exactly which stages ran.

mod mocks;

pub use mocks::{ExecutionLog, FailingStage, MockStage, SuccessStage};
