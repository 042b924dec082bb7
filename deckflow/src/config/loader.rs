//! Loading `deckflow.toml`.

use super::defaults::{default_stages, default_vars, DEFAULT_CONFIG_FILE};
use super::types::PipelineConfig;
use crate::errors::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A configuration together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    /// The parsed configuration.
    pub config: PipelineConfig,
    /// The file it was read from; `None` for the built-in pipeline.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Directory relative paths in the config are resolved against.
    #[must_use]
    pub fn base_dir(&self, fallback: &Path) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| fallback.to_path_buf(), Path::to_path_buf)
    }
}

impl PipelineConfig {
    /// Parses a configuration from TOML text.
    ///
    /// A file with no `[[stage]]` tables gets the built-in deck stages, and
    /// the built-in variables underneath its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text does not match the schema.
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

        if config.stages.is_empty() {
            config.stages = default_stages();
            let mut vars = default_vars();
            vars.append(&mut config.vars);
            config.vars = vars;
        }
        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    /// Loads `explicit` if given (it must exist), else `deckflow.toml` in
    /// `search_dir` if present, else the built-in pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if a file that should be read cannot be.
    pub fn discover(explicit: Option<&Path>, search_dir: &Path) -> Result<LoadedConfig, ConfigError> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "Loading config");
            return Ok(LoadedConfig {
                config: Self::load(path)?,
                path: Some(path.to_path_buf()),
            });
        }

        let candidate = search_dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "Loading config");
            return Ok(LoadedConfig {
                config: Self::load(&candidate)?,
                path: Some(candidate),
            });
        }

        debug!(search_dir = %search_dir.display(), "No config file, using built-in pipeline");
        Ok(LoadedConfig {
            config: Self::default(),
            path: None,
        })
    }
}
