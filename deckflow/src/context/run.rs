//! Run context and placeholder expansion.

use super::RunIdentity;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholder that expands to the working directory.
pub const WORKDIR_VAR: &str = "workdir";

/// Placeholder that expands to the publish destination.
pub const DEST_VAR: &str = "dest";

/// A `{name}` reference with no value in the run context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved placeholder '{{{name}}}' in '{template}'")]
pub struct UnresolvedPlaceholder {
    /// The placeholder name.
    pub name: String,
    /// The template it appeared in.
    pub template: String,
}

/// Explicit, immutable state shared by every stage in a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    identity: RunIdentity,
    working_dir: PathBuf,
    destination: Option<String>,
    vars: BTreeMap<String, String>,
}

impl RunContext {
    /// Creates a context rooted at `working_dir`.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            identity: RunIdentity::new(),
            working_dir: working_dir.into(),
            destination: None,
            vars: BTreeMap::new(),
        }
    }

    /// Sets the publish destination.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Adds a template variable. Built-in names (`workdir`, `dest`) win.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Adds several template variables.
    #[must_use]
    pub fn with_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.vars.extend(vars);
        self
    }

    /// Replaces the run identity.
    #[must_use]
    pub fn with_identity(mut self, identity: RunIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Returns the publish destination.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Looks up a template variable.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<String> {
        match name {
            WORKDIR_VAR => Some(self.working_dir.display().to_string()),
            DEST_VAR => self.destination.clone(),
            _ => self.vars.get(name).cloned(),
        }
    }

    /// Expands `{name}` placeholders in `template`.
    ///
    /// `{{` and `}}` produce literal braces.
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvedPlaceholder`] for the first reference with no value.
    pub fn expand(&self, template: &str) -> Result<String, UnresolvedPlaceholder> {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for next in chars.by_ref() {
                        if next == '}' {
                            closed = true;
                            break;
                        }
                        name.push(next);
                    }
                    if !closed {
                        // Unterminated: keep the text as written.
                        out.push('{');
                        out.push_str(&name);
                        continue;
                    }
                    let value = self.var(&name).ok_or_else(|| UnresolvedPlaceholder {
                        name: name.clone(),
                        template: template.to_string(),
                    })?;
                    out.push_str(&value);
                }
                other => out.push(other),
            }
        }

        Ok(out)
    }
}
