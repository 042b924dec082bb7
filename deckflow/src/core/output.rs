//! Stage output type with factory methods.

use super::StageStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The output of a stage execution.
///
/// The runner only looks at `status`; the remaining fields feed the
/// failure error and the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    /// The status of the stage execution.
    pub status: StageStatus,

    /// Exit code of the external tool, when it exited normally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Error message (for failed executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Additional metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Default for StageOutput {
    fn default() -> Self {
        Self::ok()
    }
}

impl StageOutput {
    /// Creates a successful output.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: StageStatus::Ok,
            exit_code: Some(0),
            error: None,
            metadata: HashMap::new(),
        }
    }

    /// Creates a successful output carrying metadata.
    #[must_use]
    pub fn ok_with_metadata(metadata: HashMap<String, serde_json::Value>) -> Self {
        Self {
            metadata,
            ..Self::ok()
        }
    }

    /// Creates a failure output with no exit code, e.g. a spawn error or a
    /// process killed by a signal.
    #[must_use]
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Fail,
            exit_code: None,
            error: Some(error.into()),
            metadata: HashMap::new(),
        }
    }

    /// Creates a failure output for a tool that exited with `code`.
    #[must_use]
    pub fn fail_with_code(code: i32, error: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::fail(error)
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_output() {
        let output = StageOutput::ok();
        assert!(output.is_success());
        assert_eq!(output.exit_code, Some(0));
        assert!(output.error.is_none());
    }

    #[test]
    fn test_fail_output() {
        let output = StageOutput::fail("program not found");
        assert!(output.is_failure());
        assert_eq!(output.exit_code, None);
        assert_eq!(output.error.as_deref(), Some("program not found"));
    }

    #[test]
    fn test_fail_with_code() {
        let output = StageOutput::fail_with_code(12, "rsync protocol error");
        assert!(output.is_failure());
        assert_eq!(output.exit_code, Some(12));
    }

    #[test]
    fn test_metadata_skipped_when_empty() {
        let json = serde_json::to_value(StageOutput::ok()).unwrap();
        assert!(json.get("metadata").is_none());

        let output = StageOutput::ok().with_metadata("removed", json!(3));
        let json = serde_json::to_value(output).unwrap();
        assert_eq!(json["metadata"]["removed"], json!(3));
    }
}
