//! Configuration file schema.

use super::defaults::{default_pipeline_name, default_stages, default_vars};
use crate::errors::{ConfigError, DeckflowError};
use crate::events::EventSink;
use crate::pipeline::{Pipeline, PipelineBuilder, StageSpec};
use crate::stages::{CommandStage, RemoveStage, Stage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// The whole pipeline definition, as read from `deckflow.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Pipeline name.
    #[serde(default = "default_pipeline_name")]
    pub name: String,

    /// Publish destination, e.g. `host:/srv/www/slides/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Working directory, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Extra placeholder variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,

    /// Stages in execution order. Empty means the built-in deck stages.
    #[serde(default, rename = "stage", skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
            destination: None,
            working_dir: None,
            vars: default_vars(),
            stages: default_stages(),
        }
    }
}

/// One `[[stage]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    /// Stage name.
    pub name: String,

    /// Alternate target names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Shown by `--list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// External command argv.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// Glob patterns to delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<Vec<String>>,
}

impl StageConfig {
    /// Creates a command stage entry.
    #[must_use]
    pub fn command(name: impl Into<String>, argv: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            command: Some(argv.into_iter().map(Into::into).collect()),
            remove: None,
        }
    }

    /// Creates a remove stage entry.
    #[must_use]
    pub fn remove(name: impl Into<String>, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            command: None,
            remove: Some(patterns.into_iter().map(Into::into).collect()),
        }
    }

    /// Adds an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Converts the entry into a stage specification.
    ///
    /// # Errors
    ///
    /// Returns an error unless exactly one of `command` and `remove` is set
    /// and non-empty.
    pub fn to_spec(&self) -> Result<StageSpec, ConfigError> {
        let runner: Arc<dyn Stage> = match (&self.command, &self.remove) {
            (Some(argv), None) => Arc::new(
                CommandStage::from_argv(&self.name, argv)
                    .ok_or_else(|| ConfigError::invalid_stage(&self.name, "`command` is empty"))?,
            ),
            (None, Some(patterns)) if patterns.is_empty() => {
                return Err(ConfigError::invalid_stage(&self.name, "`remove` is empty"));
            }
            (None, Some(patterns)) => Arc::new(RemoveStage::new(&self.name, patterns.iter().cloned())),
            (Some(_), Some(_)) => {
                return Err(ConfigError::invalid_stage(
                    &self.name,
                    "set either `command` or `remove`, not both",
                ));
            }
            (None, None) => {
                return Err(ConfigError::invalid_stage(
                    &self.name,
                    "one of `command` or `remove` is required",
                ));
            }
        };

        let mut spec = StageSpec::new(&self.name, runner).with_aliases(self.aliases.iter().cloned());
        if let Some(description) = &self.description {
            spec = spec.with_description(description);
        }
        Ok(spec)
    }
}

impl PipelineConfig {
    /// Builds the immutable pipeline described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DeckflowError::Config`] for malformed stage entries and
    /// [`DeckflowError::Validation`] for duplicate or reserved names.
    pub fn build_pipeline(&self, sink: Arc<dyn EventSink>) -> Result<Pipeline, DeckflowError> {
        let mut builder = PipelineBuilder::new(&self.name).with_event_sink(sink);
        for stage in &self.stages {
            builder.add_stage_spec(stage.to_spec()?)?;
        }
        Ok(builder.build()?)
    }
}
