//! Stage specifications.

use super::ALL_TARGET;
use crate::errors::{ContractErrorInfo, PipelineValidationError};
use crate::stages::Stage;
use std::sync::Arc;

/// Specification for a single stage in a pipeline.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// The unique name of the stage.
    pub name: String,
    /// Position in the fixed sequence. Assigned by the builder.
    pub order: usize,
    /// Alternate target names that resolve to this stage.
    pub aliases: Vec<String>,
    /// Optional description shown when listing stages.
    pub description: Option<String>,
    /// The stage implementation.
    pub runner: Arc<dyn Stage>,
}

impl StageSpec {
    /// Creates a new stage specification.
    #[must_use]
    pub fn new(name: impl Into<String>, runner: Arc<dyn Stage>) -> Self {
        Self {
            name: name.into(),
            order: 0,
            aliases: Vec::new(),
            description: None,
            runner,
        }
    }

    /// Adds an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Adds several aliases.
    #[must_use]
    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the name followed by the aliases.
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Returns the description, falling back to the runner's own summary.
    #[must_use]
    pub fn summary(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.runner.describe())
    }

    /// Validates the stage name and aliases in isolation.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or whitespace-bearing name, use of the
    /// reserved `all` target, or an alias repeated within this stage.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        let mut seen: Vec<&str> = Vec::new();
        for target in self.target_names() {
            validate_target_name(&self.name, target)?;
            if seen.contains(&target) {
                return Err(duplicate_error(target, &self.name, &self.name));
            }
            seen.push(target);
        }
        Ok(())
    }
}

fn validate_target_name(stage: &str, target: &str) -> Result<(), PipelineValidationError> {
    if target.is_empty() || target.chars().any(char::is_whitespace) {
        return Err(PipelineValidationError::new(format!(
            "Stage target name '{target}' must be non-empty and contain no whitespace"
        ))
        .with_stages(vec![stage.to_string()])
        .with_error_info(
            ContractErrorInfo::new("PIPELINE-004-INVALID_NAME", "Invalid stage name")
                .with_context_entry("name", target),
        ));
    }

    if target == ALL_TARGET {
        return Err(PipelineValidationError::new(format!(
            "Stage '{stage}' cannot use the reserved target name '{ALL_TARGET}'"
        ))
        .with_stages(vec![stage.to_string()])
        .with_error_info(
            ContractErrorInfo::new(
                "PIPELINE-003-RESERVED",
                format!("'{ALL_TARGET}' runs every stage and cannot name a single one"),
            )
            .with_fix_hint("Pick a different stage name or alias."),
        ));
    }

    Ok(())
}

pub(super) fn duplicate_error(target: &str, stage: &str, existing: &str) -> PipelineValidationError {
    PipelineValidationError::new(format!(
        "Target name '{target}' of stage '{stage}' is already used by stage '{existing}'"
    ))
    .with_stages(vec![existing.to_string(), stage.to_string()])
    .with_error_info(
        ContractErrorInfo::new("PIPELINE-002-DUPLICATE", "Stage names and aliases must be unique")
            .with_fix_hint("Rename the stage or drop the conflicting alias.")
            .with_context_entry("name", target),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::NoOpStage;

    fn spec(name: &str) -> StageSpec {
        StageSpec::new(name, Arc::new(NoOpStage::new(name)))
    }

    #[test]
    fn test_stage_spec_creation() {
        let spec = spec("render").with_alias("deck").with_description("Render slides");

        assert_eq!(spec.name, "render");
        assert_eq!(spec.target_names().collect::<Vec<_>>(), vec!["render", "deck"]);
        assert_eq!(spec.summary(), "Render slides");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_summary_falls_back_to_runner() {
        assert_eq!(spec("noop").summary(), "noop");
    }

    #[test]
    fn test_reserved_name() {
        let err = spec("all").validate().unwrap_err();
        assert_eq!(err.code(), Some("PIPELINE-003-RESERVED"));

        let err = spec("render").with_alias("all").validate().unwrap_err();
        assert_eq!(err.code(), Some("PIPELINE-003-RESERVED"));
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "two words", " "] {
            let err = spec(name).validate().unwrap_err();
            assert_eq!(err.code(), Some("PIPELINE-004-INVALID_NAME"));
        }
    }

    #[test]
    fn test_alias_repeating_name() {
        let err = spec("clean").with_alias("clean").validate().unwrap_err();
        assert_eq!(err.code(), Some("PIPELINE-002-DUPLICATE"));
    }
}
