use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use deckflow::config::{parse_assignment, Overrides, PipelineConfig};
use deckflow::context::RunContext;
use deckflow::errors::DeckflowError;
use deckflow::events::LoggingEventSink;
use deckflow::pipeline::{Pipeline, PipelineReport, StageSpec, ALL_TARGET};

use crate::logging::LogFormat;

const EXIT_STAGE_FAILED: u8 = 1;
const EXIT_UNKNOWN_TARGET: u8 = 2;
const EXIT_CONFIG: u8 = 3;

/// Entry point for the `deckflow` command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "deckflow",
    about = "Render, publish and clean up a slide deck",
    version,
    long_about = None
)]
pub struct Cli {
    /// Stage name, alias, or `all`
    #[arg(default_value = ALL_TARGET)]
    pub target: String,

    /// Pipeline config file (default: deckflow.toml in the working directory)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Working directory shared by all stages
    #[arg(short = 'C', long = "workdir")]
    pub workdir: Option<PathBuf>,

    /// Publish destination, e.g. host:/srv/www/slides/
    #[arg(long = "dest")]
    pub dest: Option<String>,

    /// Extra placeholder variable (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// List stages and exit
    #[arg(long, conflicts_with = "dry_run")]
    pub list: bool,

    /// Print the stages the target would run, without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log line format
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Overrides given on the command line.
    fn overrides(&self) -> Result<Overrides> {
        let vars = self
            .vars
            .iter()
            .map(|raw| parse_assignment(raw).map_err(DeckflowError::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Overrides {
            working_dir: self.workdir.clone(),
            destination: self.dest.clone(),
            vars,
        })
    }

    pub async fn run(&self) -> Result<ExitCode> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        let env = Overrides::from_env().map_err(DeckflowError::from)?;
        let overrides = self.overrides()?.or(env);

        let search_dir = overrides.working_dir.clone().unwrap_or_else(|| cwd.clone());
        let loaded = PipelineConfig::discover(self.config.as_deref(), &search_dir)
            .map_err(DeckflowError::from)?;
        let pipeline = loaded
            .config
            .build_pipeline(Arc::new(LoggingEventSink::debug()))?;
        let ctx = overrides.run_context(&loaded, &search_dir);

        if self.list {
            print_stages(&pipeline, &ctx);
            return Ok(ExitCode::SUCCESS);
        }

        if self.dry_run {
            let plan = pipeline.resolve(&self.target).map_err(DeckflowError::from)?;
            println!("Target '{}' would run:", self.target);
            for spec in plan {
                println!("  {}. {:<10} {}", spec.order + 1, spec.name, summary(spec, &ctx));
            }
            return Ok(ExitCode::SUCCESS);
        }

        let report = pipeline
            .execute(&self.target, &ctx)
            .await
            .map_err(DeckflowError::from)?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize run report")?
            );
        } else {
            print_summary(&report);
        }

        report
            .into_result()
            .map_err(DeckflowError::from)
            .with_context(|| format!("Pipeline '{}' stopped", pipeline.name()))?;
        Ok(ExitCode::SUCCESS)
    }
}

/// Maps an error to the process exit status.
///
/// A failing stage's own exit code is propagated when it has one.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DeckflowError>() {
        Some(DeckflowError::StageExecution(failure)) => failure
            .exit_code
            .and_then(|code| u8::try_from(code).ok())
            .filter(|code| *code != 0)
            .unwrap_or(EXIT_STAGE_FAILED),
        Some(DeckflowError::UnknownTarget(_)) => EXIT_UNKNOWN_TARGET,
        Some(DeckflowError::Validation(_) | DeckflowError::Config(_) | DeckflowError::Io(_)) => {
            EXIT_CONFIG
        }
        None => EXIT_STAGE_FAILED,
    }
}

fn summary(spec: &StageSpec, ctx: &RunContext) -> String {
    let raw = spec.summary();
    ctx.expand(&raw).unwrap_or(raw)
}

fn print_stages(pipeline: &Pipeline, ctx: &RunContext) {
    println!("Pipeline '{}' ({} stages):", pipeline.name(), pipeline.len());
    for spec in pipeline.stages() {
        let aliases = if spec.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", spec.aliases.join(", "))
        };
        println!("  {}. {}{}", spec.order + 1, spec.name, aliases);
        println!("     {}", summary(spec, ctx));
    }
    println!("  {ALL_TARGET}: run every stage in order, stopping at the first failure");
}

fn print_summary(report: &PipelineReport) {
    for stage in &report.stages {
        let marker = match stage.status {
            deckflow::core::StageStatus::Ok => "✓",
            deckflow::core::StageStatus::Fail => "✗",
            _ => "-",
        };
        match stage.duration_ms {
            Some(ms) => println!("{marker} {} ({ms:.0} ms)", stage.name),
            None => println!("{marker} {} ({})", stage.name, stage.status),
        }
    }
}
