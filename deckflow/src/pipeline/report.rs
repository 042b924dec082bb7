//! Run reports.

use crate::core::{StageOutput, StageStatus};
use crate::errors::StageExecutionError;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// What happened to one planned stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// Position in the pipeline.
    pub order: usize,
    /// Final status.
    pub status: StageStatus,
    /// Exit code reported by the stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Error message for a failed stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time, for stages that ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// Stage metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl StageRecord {
    /// Creates a pending record.
    #[must_use]
    pub fn pending(name: impl Into<String>, order: usize) -> Self {
        Self {
            name: name.into(),
            order,
            status: StageStatus::Pending,
            exit_code: None,
            error: None,
            duration_ms: None,
            metadata: HashMap::new(),
        }
    }

    /// Fills the record from a finished stage.
    ///
    /// A finished stage is either `ok` or `fail`; any other status the stage
    /// reported counts as a failure.
    pub fn finish(&mut self, output: StageOutput, duration_ms: f64) {
        self.status = if output.is_success() {
            StageStatus::Ok
        } else {
            StageStatus::Fail
        };
        self.exit_code = output.exit_code;
        self.error = output.error;
        self.metadata = output.metadata;
        self.duration_ms = Some(duration_ms);
    }

    /// Returns true if the stage was started.
    #[must_use]
    pub fn was_executed(&self) -> bool {
        matches!(self.status, StageStatus::Ok | StageStatus::Fail)
    }
}

/// Outcome of one `run` of a pipeline target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Pipeline name.
    pub pipeline: String,
    /// The requested target.
    pub target: String,
    /// Run ID from the run context.
    pub run_id: Uuid,
    /// When the run context was created.
    pub started_at: Timestamp,
    /// One record per planned stage, in execution order.
    pub stages: Vec<StageRecord>,
    /// Total wall time.
    pub duration_ms: f64,
    /// Whether every planned stage succeeded.
    pub success: bool,
}

impl PipelineReport {
    /// Names of the stages that were started, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.was_executed())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Names of the stages that completed successfully, in order.
    #[must_use]
    pub fn completed(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.status == StageStatus::Ok)
            .map(|s| s.name.as_str())
            .collect()
    }

    /// The failing stage, if any.
    #[must_use]
    pub fn failed_stage(&self) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.status == StageStatus::Fail)
    }

    /// Converts a failed report into the terminal error naming the stage.
    ///
    /// # Errors
    ///
    /// Returns [`StageExecutionError`] when a stage failed.
    pub fn into_result(self) -> Result<Self, StageExecutionError> {
        match self.failed_stage() {
            None => Ok(self),
            Some(failed) => Err(StageExecutionError::new(
                failed.name.clone(),
                failed.exit_code,
                failed.error.clone().unwrap_or_else(|| "stage failed".to_string()),
            )
            .with_completed(self.completed().into_iter().map(String::from).collect())),
        }
    }
}
