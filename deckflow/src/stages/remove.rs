//! Stage that deletes generated files from the working directory.

use super::Stage;
use crate::context::RunContext;
use crate::core::StageOutput;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Removes regular files matching glob patterns, relative to the working
/// directory.
///
/// Matching nothing is a successful no-op, so running the stage twice
/// leaves the directory as a single run does. Directories are never removed.
#[derive(Debug, Clone)]
pub struct RemoveStage {
    name: String,
    patterns: Vec<String>,
}

impl RemoveStage {
    /// Creates a remove stage.
    #[must_use]
    pub fn new(name: impl Into<String>, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the patterns.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Paths matched by the patterns, including directories.
    fn matches(&self, root: &Path) -> Result<BTreeSet<PathBuf>, String> {
        let root_str = root
            .to_str()
            .ok_or_else(|| format!("working directory is not valid UTF-8: {}", root.display()))?;
        let escaped_root = glob::Pattern::escape(root_str);

        let mut found = BTreeSet::new();
        for pattern in &self.patterns {
            let relative = Path::new(pattern);
            if relative.is_absolute()
                || relative.components().any(|c| matches!(c, Component::ParentDir))
            {
                return Err(format!(
                    "pattern '{pattern}' must stay inside the working directory"
                ));
            }

            let full = format!("{escaped_root}/{pattern}");
            let paths = glob::glob(&full).map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
            for entry in paths {
                let path = entry.map_err(|e| format!("cannot read {}: {}", e.path().display(), e.error()))?;
                found.insert(path);
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl Stage for RemoveStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("remove {}", self.patterns.join(" "))
    }

    async fn execute(&self, ctx: &RunContext) -> StageOutput {
        let paths = match self.matches(ctx.working_dir()) {
            Ok(paths) => paths,
            Err(message) => return StageOutput::fail(message),
        };

        let mut removed = 0usize;
        for path in &paths {
            let is_dir = tokio::fs::symlink_metadata(path)
                .await
                .map_or(true, |meta| meta.is_dir());
            if is_dir {
                continue;
            }
            match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    debug!(stage = %self.name, path = %path.display(), "Removed file");
                    removed += 1;
                }
                // Already gone: nothing left to clean.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return StageOutput::fail(format!("cannot remove {}: {e}", path.display()))
                        .with_metadata("removed", serde_json::json!(removed));
                }
            }
        }

        StageOutput::ok().with_metadata("removed", serde_json::json!(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn seeded() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("slides.md"), "# Deck").unwrap();
        fs::write(dir.path().join("slides.html"), "<html/>").unwrap();
        fs::write(dir.path().join("notes.html"), "<html/>").unwrap();
        fs::create_dir(dir.path().join("assets.html")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_removes_matching_files_only() {
        let dir = seeded();
        let stage = RemoveStage::new("cleanup", ["*.html"]);

        let output = stage.execute(&RunContext::new(dir.path())).await;

        assert!(output.is_success());
        assert_eq!(output.metadata["removed"], 2);
        assert_eq!(listing(dir.path()), vec!["assets.html", "slides.md"]);
    }

    #[tokio::test]
    async fn test_cleanup_twice_equals_once() {
        let dir = seeded();
        let stage = RemoveStage::new("cleanup", ["*.html"]);
        let ctx = RunContext::new(dir.path());

        assert!(stage.execute(&ctx).await.is_success());
        let after_one = listing(dir.path());

        let second = stage.execute(&ctx).await;
        assert!(second.is_success());
        assert_eq!(second.metadata["removed"], 0);
        assert_eq!(listing(dir.path()), after_one);
    }

    #[tokio::test]
    async fn test_overlapping_patterns_remove_once() {
        let dir = seeded();
        let stage = RemoveStage::new("cleanup", ["*.html", "slides.*"]);

        let output = stage.execute(&RunContext::new(dir.path())).await;

        assert!(output.is_success());
        assert_eq!(output.metadata["removed"], 3);
        assert_eq!(listing(dir.path()), vec!["assets.html"]);
    }

    #[tokio::test]
    async fn test_rejects_escaping_patterns() {
        let dir = seeded();
        for pattern in ["../*.html", "/tmp/*.html"] {
            let output = RemoveStage::new("cleanup", [pattern])
                .execute(&RunContext::new(dir.path()))
                .await;
            assert!(output.is_failure(), "{pattern} should be rejected");
        }
        assert_eq!(listing(dir.path()).len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        let dir = seeded();
        let output = RemoveStage::new("cleanup", ["[*.html"])
            .execute(&RunContext::new(dir.path()))
            .await;
        assert!(output.is_failure());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_permission_error_fails_with_partial_count() {
        use std::os::unix::fs::PermissionsExt;

        let dir = seeded();
        let locked = dir.path().join("zz-locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("old.html"), "<html/>").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores directory permissions.
        if fs::write(locked.join("write-check"), "").is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        // Paths are removed in sorted order, so the locked file comes last.
        let output = RemoveStage::new("cleanup", ["*.html", "zz-locked/*.html"])
            .execute(&RunContext::new(dir.path()))
            .await;

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(output.is_failure());
        assert!(output.error.unwrap().contains("old.html"));
        assert_eq!(output.metadata["removed"], 2);
        assert!(locked.join("old.html").exists());
        assert!(!dir.path().join("notes.html").exists());
    }

    #[test]
    fn test_describe() {
        assert_eq!(RemoveStage::new("cleanup", ["*.html", "*.pdf"]).describe(), "remove *.html *.pdf");
    }
}
