//! Pipeline builder with validation.

use super::spec::duplicate_error;
use super::{Pipeline, StageSpec};
use crate::errors::{ContractErrorInfo, PipelineValidationError};
use crate::events::{EventSink, NoOpEventSink};
use crate::stages::Stage;
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for creating validated pipelines.
///
/// Stages run in the order they are added.
pub struct PipelineBuilder {
    name: String,
    stages: Vec<StageSpec>,
    /// Stage name and alias -> index into `stages`.
    lookup: HashMap<String, usize>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            lookup: HashMap::new(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Adds a stage with no aliases.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, reserved, or already taken.
    pub fn stage(
        mut self,
        name: impl Into<String>,
        runner: Arc<dyn Stage>,
    ) -> Result<Self, PipelineValidationError> {
        self.add_stage_spec(StageSpec::new(name, runner))?;
        Ok(self)
    }

    /// Adds a stage from a full specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, reserved, or already taken.
    pub fn spec(mut self, spec: StageSpec) -> Result<Self, PipelineValidationError> {
        self.add_stage_spec(spec)?;
        Ok(self)
    }

    /// Adds a stage specification in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or an alias is invalid, reserved, or
    /// already used by another stage.
    pub fn add_stage_spec(&mut self, mut spec: StageSpec) -> Result<(), PipelineValidationError> {
        spec.validate()?;

        for target in spec.target_names() {
            if let Some(&index) = self.lookup.get(target) {
                return Err(duplicate_error(target, &spec.name, &self.stages[index].name));
            }
        }

        let index = self.stages.len();
        spec.order = index;
        for target in spec.target_names() {
            self.lookup.insert(target.to_string(), index);
        }
        self.stages.push(spec);
        Ok(())
    }

    /// Sets the sink that receives run events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline name is blank or there are no stages.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "Pipeline name cannot be empty or whitespace-only",
            )
            .with_error_info(ContractErrorInfo::new(
                "PIPELINE-004-INVALID_NAME",
                "Invalid pipeline name",
            )));
        }

        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no stages").with_error_info(
                ContractErrorInfo::new("PIPELINE-001-EMPTY", "Cannot build an empty pipeline")
                    .with_fix_hint("Add at least one stage to the pipeline before building."),
            ));
        }

        Ok(Pipeline::new(self.name, self.stages, self.lookup, self.sink))
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::NoOpStage;

    fn noop(name: &str) -> Arc<dyn Stage> {
        Arc::new(NoOpStage::new(name))
    }

    #[test]
    fn test_builder_creation() {
        let builder = PipelineBuilder::new("deck");
        assert_eq!(builder.name(), "deck");
        assert_eq!(builder.stage_count(), 0);
    }

    #[test]
    fn test_builder_assigns_order() {
        let pipeline = PipelineBuilder::new("deck")
            .stage("render", noop("render"))
            .unwrap()
            .stage("publish", noop("publish"))
            .unwrap()
            .stage("cleanup", noop("cleanup"))
            .unwrap()
            .build()
            .unwrap();

        let orders: Vec<usize> = pipeline.stages().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(pipeline.stage_names(), vec!["render", "publish", "cleanup"]);
    }

    #[test]
    fn test_builder_duplicate_name() {
        let err = PipelineBuilder::new("deck")
            .stage("render", noop("render"))
            .unwrap()
            .stage("render", noop("render"))
            .unwrap_err();

        assert_eq!(err.code(), Some("PIPELINE-002-DUPLICATE"));
        assert_eq!(err.stages, vec!["render".to_string(), "render".to_string()]);
    }

    #[test]
    fn test_builder_alias_collides_with_name() {
        let err = PipelineBuilder::new("deck")
            .stage("clean", noop("clean"))
            .unwrap()
            .spec(StageSpec::new("cleanup", noop("cleanup")).with_alias("clean"))
            .unwrap_err();

        assert_eq!(err.code(), Some("PIPELINE-002-DUPLICATE"));
    }

    #[test]
    fn test_builder_reserved_name() {
        let err = PipelineBuilder::new("deck").stage("all", noop("all")).unwrap_err();
        assert_eq!(err.code(), Some("PIPELINE-003-RESERVED"));
    }

    #[test]
    fn test_builder_empty_build() {
        let err = PipelineBuilder::new("deck").build().unwrap_err();
        assert_eq!(err.code(), Some("PIPELINE-001-EMPTY"));
    }

    #[test]
    fn test_builder_blank_pipeline_name() {
        let err = PipelineBuilder::new("  ")
            .stage("a", noop("a"))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("PIPELINE-004-INVALID_NAME"));
    }

    #[test]
    fn test_failed_add_leaves_builder_unchanged() {
        let mut builder = PipelineBuilder::new("deck");
        builder
            .add_stage_spec(StageSpec::new("render", noop("render")).with_alias("deck"))
            .unwrap();
        assert!(builder
            .add_stage_spec(StageSpec::new("deck", noop("deck")))
            .is_err());

        assert_eq!(builder.stage_count(), 1);
    }
}
