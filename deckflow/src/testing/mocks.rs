//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::RunContext;
use crate::core::StageOutput;
use crate::stages::Stage;

/// Shared, ordered record of stage executions.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ExecutionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage name.
    pub fn record(&self, stage: &str) {
        self.entries.lock().push(stage.to_string());
    }

    /// Returns the recorded stage names in execution order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns true if nothing ran.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Clears the log.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// A mock stage that records calls and returns a configurable output.
#[derive(Debug)]
pub struct MockStage {
    name: String,
    output: Mutex<StageOutput>,
    call_count: Mutex<usize>,
    log: Option<ExecutionLog>,
}

impl MockStage {
    /// Creates a new mock stage with a success output.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: Mutex::new(StageOutput::ok()),
            call_count: Mutex::new(0),
            log: None,
        }
    }

    /// Records every execution into `log`.
    #[must_use]
    pub fn with_log(mut self, log: &ExecutionLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Sets the output to return.
    pub fn set_output(&self, output: StageOutput) {
        *self.output.lock() = output;
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

#[async_trait]
impl Stage for MockStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutput {
        *self.call_count.lock() += 1;
        if let Some(log) = &self.log {
            log.record(&self.name);
        }
        self.output.lock().clone()
    }
}

/// A stage that always succeeds and logs its execution.
#[derive(Debug)]
pub struct SuccessStage {
    name: String,
    log: ExecutionLog,
}

impl SuccessStage {
    /// Creates a new success stage.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &ExecutionLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
        }
    }
}

#[async_trait]
impl Stage for SuccessStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutput {
        self.log.record(&self.name);
        StageOutput::ok()
    }
}

/// A stage that always fails and logs its execution.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    exit_code: Option<i32>,
    error: String,
    log: ExecutionLog,
}

impl FailingStage {
    /// Creates a failing stage that reports exit code 1.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>, log: &ExecutionLog) -> Self {
        Self {
            name: name.into(),
            exit_code: Some(1),
            error: error.into(),
            log: log.clone(),
        }
    }

    /// Sets the exit code to report; `None` models a signal.
    #[must_use]
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutput {
        self.log.record(&self.name);
        match self.exit_code {
            Some(code) => StageOutput::fail_with_code(code, &self.error),
            None => StageOutput::fail(&self.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_stage_counts_and_logs() {
        let log = ExecutionLog::new();
        let stage = MockStage::new("a").with_log(&log);
        stage.set_output(StageOutput::fail("nope"));

        let output = stage.execute(&RunContext::new(".")).await;

        assert!(output.is_failure());
        assert_eq!(stage.call_count(), 1);
        assert_eq!(log.entries(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_failing_stage_signal() {
        let log = ExecutionLog::new();
        let stage = FailingStage::new("b", "killed", &log).with_exit_code(None);

        let output = stage.execute(&RunContext::new(".")).await;
        assert_eq!(output.exit_code, None);

        log.clear();
        assert!(log.is_empty());
    }
}
