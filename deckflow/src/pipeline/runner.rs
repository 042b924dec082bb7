//! Fail-fast sequential pipeline execution.

use super::{PipelineReport, StageRecord, StageSpec, ALL_TARGET};
use crate::context::RunContext;
use crate::core::{PipelineEvent, StageStatus};
use crate::errors::{DeckflowError, UnknownTargetError};
use crate::events::EventSink;
use crate::utils::duration_ms;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info_span, Instrument};

/// An immutable, ordered sequence of stages.
///
/// Built once by [`super::PipelineBuilder`] and never reordered. Stages run
/// one at a time; the first failure stops the run.
pub struct Pipeline {
    name: String,
    stages: Vec<StageSpec>,
    lookup: HashMap<String, usize>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub(super) fn new(
        name: String,
        stages: Vec<StageSpec>,
        lookup: HashMap<String, usize>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            name,
            stages,
            lookup,
            sink,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false: the builder rejects empty pipelines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Looks up a stage by name or alias.
    #[must_use]
    pub fn get(&self, target: &str) -> Option<&StageSpec> {
        self.lookup.get(target).map(|&i| &self.stages[i])
    }

    /// Every accepted target: stage names and aliases in declared order,
    /// then `all`.
    #[must_use]
    pub fn targets(&self) -> Vec<String> {
        self.stages
            .iter()
            .flat_map(StageSpec::target_names)
            .map(String::from)
            .chain(std::iter::once(ALL_TARGET.to_string()))
            .collect()
    }

    /// Resolves a target to the stages it runs, without running anything.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTargetError`] if `target` is neither a stage name,
    /// an alias, nor `all`.
    pub fn resolve(&self, target: &str) -> Result<Vec<&StageSpec>, UnknownTargetError> {
        if target == ALL_TARGET {
            return Ok(self.stages.iter().collect());
        }
        self.get(target)
            .map(|spec| vec![spec])
            .ok_or_else(|| UnknownTargetError::new(target, self.targets()))
    }

    /// Runs `target` and returns the report, or the first failure as an error.
    ///
    /// # Errors
    ///
    /// Returns [`DeckflowError::UnknownTarget`] (no stage executed) or
    /// [`DeckflowError::StageExecution`] naming the first failing stage.
    pub async fn run(&self, target: &str, ctx: &RunContext) -> Result<PipelineReport, DeckflowError> {
        let report = self.execute(target, ctx).await?;
        Ok(report.into_result()?)
    }

    /// Runs `target` and always returns a report, even when a stage fails.
    ///
    /// Stages after a failure are recorded as [`StageStatus::NotRun`].
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTargetError`] before executing anything if the
    /// target does not resolve.
    pub async fn execute(
        &self,
        target: &str,
        ctx: &RunContext,
    ) -> Result<PipelineReport, UnknownTargetError> {
        let plan = match self.resolve(target) {
            Ok(plan) => plan,
            Err(err) => {
                debug!(pipeline = %self.name, target = %target, "Unknown target");
                return Err(err);
            }
        };

        let run_id = ctx.identity().run_id_string();
        let span = info_span!("pipeline", pipeline = %self.name, target = %target, run_id = %run_id);
        Ok(self.execute_plan(target, &plan, ctx).instrument(span).await)
    }

    async fn execute_plan(&self, target: &str, plan: &[&StageSpec], ctx: &RunContext) -> PipelineReport {
        let run_id = ctx.identity().run_id_string();
        let names: Vec<String> = plan.iter().map(|s| s.name.clone()).collect();
        let start = Instant::now();

        self.sink
            .emit(&PipelineEvent::pipeline_started(&self.name, target, &run_id, &names));

        let mut records: Vec<StageRecord> = plan
            .iter()
            .map(|s| StageRecord::pending(s.name.clone(), s.order))
            .collect();

        let mut failed = None;
        for (index, spec) in plan.iter().enumerate() {
            records[index].status = StageStatus::Running;
            self.sink.emit(&PipelineEvent::stage_started(&spec.name, spec.order));

            let stage_start = Instant::now();
            let output = spec
                .runner
                .execute(ctx)
                .instrument(info_span!("stage", stage = %spec.name))
                .await;
            let elapsed = duration_ms(stage_start.elapsed());

            if output.is_success() {
                self.sink.emit(&PipelineEvent::stage_completed(&spec.name, elapsed));
                records[index].finish(output, elapsed);
                continue;
            }

            let message = output.error.clone().unwrap_or_else(|| {
                if output.is_failure() {
                    "stage failed".to_string()
                } else {
                    format!("stage ended with status '{}'", output.status)
                }
            });
            self.sink.emit(&PipelineEvent::stage_failed(
                &spec.name,
                output.exit_code,
                &message,
                elapsed,
            ));
            records[index].finish(output, elapsed);
            records[index].error = Some(message.clone());
            failed = Some((index, message));
            break;
        }

        let total = duration_ms(start.elapsed());
        let success = match failed {
            None => {
                self.sink
                    .emit(&PipelineEvent::pipeline_completed(&self.name, &run_id, total));
                true
            }
            Some((index, message)) => {
                for record in &mut records[index + 1..] {
                    record.status = StageStatus::NotRun;
                }
                let stage = &records[index].name;
                self.sink
                    .emit(&PipelineEvent::pipeline_failed(&self.name, &run_id, stage, &message));
                false
            }
        };

        PipelineReport {
            pipeline: self.name.clone(),
            target: target.to_string(),
            run_id: ctx.identity().run_id,
            started_at: ctx.identity().started_at,
            stages: records,
            duration_ms: total,
            success,
        }
    }
}
