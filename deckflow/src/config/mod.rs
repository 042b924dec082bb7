//! Pipeline configuration.
//!
//! Stages come from `deckflow.toml` or, when it is absent, the built-in deck
//! pipeline. Working directory and destination are layered: command line,
//! then environment, then the file, then defaults.

mod defaults;
mod environment;
mod loader;
#[cfg(test)]
mod tests;
mod types;

pub use defaults::{DEFAULT_CONFIG_FILE, ENV_DESTINATION, ENV_WORKDIR};
pub use environment::{parse_assignment, Overrides};
pub use loader::LoadedConfig;
pub use types::{PipelineConfig, StageConfig};
