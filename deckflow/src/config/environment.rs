//! Layered overrides: command line, then environment, then config file.

use super::defaults::{ENV_DESTINATION, ENV_WORKDIR};
use super::loader::LoadedConfig;
use crate::context::RunContext;
use crate::errors::ConfigError;
use std::env;
use std::path::{Path, PathBuf};

/// Values that can override the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Working directory.
    pub working_dir: Option<PathBuf>,
    /// Publish destination.
    pub destination: Option<String>,
    /// Extra placeholder variables.
    pub vars: Vec<(String, String)>,
}

impl Overrides {
    /// Reads `DECKFLOW_WORKDIR` and `DECKFLOW_DESTINATION`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvironment`] for non-UTF-8 values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            working_dir: env_string(ENV_WORKDIR)?.map(PathBuf::from),
            destination: env_string(ENV_DESTINATION)?,
            vars: Vec::new(),
        })
    }

    /// Fills unset fields from `lower`. Variables from `self` win.
    #[must_use]
    pub fn or(self, lower: Self) -> Self {
        let mut vars = lower.vars;
        vars.extend(self.vars);
        Self {
            working_dir: self.working_dir.or(lower.working_dir),
            destination: self.destination.or(lower.destination),
            vars,
        }
    }

    /// Builds the run context: overrides first, then the config file, then
    /// `fallback_dir`.
    #[must_use]
    pub fn run_context(&self, loaded: &LoadedConfig, fallback_dir: &Path) -> RunContext {
        let config = &loaded.config;
        let working_dir = self.working_dir.clone().unwrap_or_else(|| {
            config
                .working_dir
                .as_ref()
                .map_or_else(|| fallback_dir.to_path_buf(), |dir| loaded.base_dir(fallback_dir).join(dir))
        });

        let mut ctx = RunContext::new(working_dir)
            .with_vars(config.vars.clone())
            .with_vars(self.vars.iter().cloned());
        if let Some(destination) = self.destination.as_ref().or(config.destination.as_ref()) {
            ctx = ctx.with_destination(destination.clone());
        }
        ctx
    }
}

/// Parses a `KEY=VALUE` assignment.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidVariable`] if there is no `=` or the key
/// is empty.
pub fn parse_assignment(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidVariable(raw.to_string())),
    }
}

fn env_string(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvironment(key.to_string())),
    }
}
