//! Error types for the deckflow pipeline.
//!
//! Every error is terminal: the runner never retries or rolls back, it
//! surfaces the first failure to its caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for deckflow operations.
#[derive(Debug, Error)]
pub enum DeckflowError {
    /// The requested target does not name a stage or `all`.
    #[error("{0}")]
    UnknownTarget(#[from] UnknownTargetError),

    /// A stage terminated unsuccessfully.
    #[error("{0}")]
    StageExecution(#[from] StageExecutionError),

    /// The pipeline definition is invalid.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// The configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeckflowError {
    /// Returns the name of the failing stage, if the error came from one.
    #[must_use]
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            Self::StageExecution(err) => Some(&err.stage),
            _ => None,
        }
    }
}

/// Raised when a target matches neither a stage name, an alias, nor `all`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown target '{target}' (available: {})", available.join(", "))]
pub struct UnknownTargetError {
    /// The requested target.
    pub target: String,
    /// Every target the pipeline accepts, in declared order.
    pub available: Vec<String>,
}

impl UnknownTargetError {
    /// Creates a new unknown target error.
    #[must_use]
    pub fn new(target: impl Into<String>, available: Vec<String>) -> Self {
        Self {
            target: target.into(),
            available,
        }
    }
}

/// Raised when a stage's external action terminates unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Stage '{stage}' failed{}: {message}", exit_code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
pub struct StageExecutionError {
    /// The failing stage.
    pub stage: String,
    /// Exit code reported by the tool, if it exited normally.
    pub exit_code: Option<i32>,
    /// The tool's reported message.
    pub message: String,
    /// Stages that completed before the failure. Their effects are kept.
    #[serde(default)]
    pub completed: Vec<String>,
}

impl StageExecutionError {
    /// Creates a new stage execution error.
    #[must_use]
    pub fn new(stage: impl Into<String>, exit_code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            exit_code,
            message: message.into(),
            completed: Vec::new(),
        }
    }

    /// Records the stages that completed before this failure.
    #[must_use]
    pub fn with_completed(mut self, completed: Vec<String>) -> Self {
        self.completed = completed;
        self
    }
}

/// Metadata about a validation error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "PIPELINE-002-DUPLICATE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a pipeline definition fails validation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the error code, if one was attached.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// Errors raised while loading a pipeline configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed reading config at {}: {source}", path.display())]
    Read {
        /// The config path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the config schema.
    #[error("Failed parsing config at {}: {source}", path.display())]
    Parse {
        /// The config path.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// A stage entry is malformed.
    #[error("Invalid stage '{stage}': {reason}")]
    InvalidStage {
        /// The stage name.
        stage: String,
        /// Why the entry was rejected.
        reason: String,
    },

    /// A `--var`-style assignment is malformed.
    #[error("Invalid variable assignment '{0}': expected KEY=VALUE")]
    InvalidVariable(String),

    /// An environment variable holds invalid UTF-8.
    #[error("{0} contains invalid UTF-8")]
    InvalidEnvironment(String),
}

impl ConfigError {
    /// Creates an invalid stage error.
    #[must_use]
    pub fn invalid_stage(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStage {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}
