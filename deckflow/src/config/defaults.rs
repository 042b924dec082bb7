//! The built-in deck pipeline, used when no stages are configured.

use super::types::StageConfig;
use std::collections::BTreeMap;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "deckflow.toml";

/// Environment variable overriding the working directory.
pub const ENV_WORKDIR: &str = "DECKFLOW_WORKDIR";

/// Environment variable overriding the publish destination.
pub const ENV_DESTINATION: &str = "DECKFLOW_DESTINATION";

const DEFAULT_PIPELINE_NAME: &str = "deck";
const DEFAULT_SOURCE: &str = "slides.md";
const DEFAULT_OUTPUT: &str = "slides.html";
const DEFAULT_OUTPUT_PATTERN: &str = "*.html";

pub fn default_pipeline_name() -> String {
    DEFAULT_PIPELINE_NAME.to_string()
}

/// Variables the built-in stages reference.
pub fn default_vars() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("source".to_string(), DEFAULT_SOURCE.to_string()),
        ("output".to_string(), DEFAULT_OUTPUT.to_string()),
    ])
}

/// `render` (`deck`) -> `publish` (`web`) -> `cleanup` (`clean`).
pub fn default_stages() -> Vec<StageConfig> {
    vec![
        StageConfig::command(
            "render",
            [
                "pandoc",
                "--standalone",
                "--to=revealjs",
                "--output={output}",
                "{source}",
            ],
        )
        .with_alias("deck")
        .with_description("Render {source} to {output}"),
        StageConfig::command(
            "publish",
            [
                "rsync",
                "--recursive",
                "--links",
                "--verbose",
                "--exclude=.git",
                "--chmod=go+r",
                "./",
                "{dest}",
            ],
        )
        .with_alias("web")
        .with_description("Sync the working directory to {dest}"),
        StageConfig::remove("cleanup", [DEFAULT_OUTPUT_PATTERN])
            .with_alias("clean")
            .with_description("Remove generated HTML"),
    ]
}
