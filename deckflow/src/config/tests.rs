use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::config::{parse_assignment, Overrides, PipelineConfig, DEFAULT_CONFIG_FILE};
use crate::errors::ConfigError;
use crate::events::NoOpEventSink;

const SAMPLE: &str = r#"
name = "lecture-03"
destination = "teach.example.org:/srv/www/lecture-03/"

[vars]
source = "lecture.md"

[[stage]]
name = "render"
aliases = ["deck"]
command = ["pandoc", "-s", "-o", "lecture.html", "{source}"]

[[stage]]
name = "cleanup"
aliases = ["clean"]
description = "Drop generated HTML"
remove = ["*.html"]
"#;

#[test]
fn parses_sample_config() {
    let config = PipelineConfig::from_toml_str(SAMPLE, Path::new("deckflow.toml")).unwrap();

    assert_eq!(config.name, "lecture-03");
    assert_eq!(config.destination.as_deref(), Some("teach.example.org:/srv/www/lecture-03/"));
    assert_eq!(config.vars.get("source").map(String::as_str), Some("lecture.md"));
    assert_eq!(config.stages.len(), 2);
    assert_eq!(config.stages[1].remove, Some(vec!["*.html".to_string()]));

    let pipeline = config.build_pipeline(Arc::new(NoOpEventSink)).unwrap();
    assert_eq!(pipeline.stage_names(), vec!["render", "cleanup"]);
    assert_eq!(pipeline.get("clean").unwrap().summary(), "Drop generated HTML");
}

#[test]
fn file_without_stages_uses_builtin_pipeline() {
    let config = PipelineConfig::from_toml_str(
        "destination = \"host:/www/\"\n[vars]\nsource = \"talk.md\"\n",
        Path::new("deckflow.toml"),
    )
    .unwrap();

    assert_eq!(config.name, "deck");
    let names: Vec<&str> = config.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["render", "publish", "cleanup"]);
    assert_eq!(config.vars.get("source").map(String::as_str), Some("talk.md"));
    assert_eq!(config.vars.get("output").map(String::as_str), Some("slides.html"));
}

#[test]
fn rejects_unknown_keys() {
    let err = PipelineConfig::from_toml_str("nmae = \"typo\"\n", Path::new("bad.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn discover_prefers_explicit_path() {
    let dir = TempDir::new().unwrap();
    let explicit = dir.path().join("custom.toml");
    fs::write(&explicit, SAMPLE).unwrap();
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "name = \"ignored\"\n").unwrap();

    let loaded = PipelineConfig::discover(Some(&explicit), dir.path()).unwrap();

    assert_eq!(loaded.config.name, "lecture-03");
    assert_eq!(loaded.path.as_deref(), Some(explicit.as_path()));
}

#[test]
fn discover_finds_file_in_search_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), SAMPLE).unwrap();

    let loaded = PipelineConfig::discover(None, dir.path()).unwrap();
    assert_eq!(loaded.config.name, "lecture-03");
}

#[test]
fn discover_falls_back_to_builtin() {
    let dir = TempDir::new().unwrap();

    let loaded = PipelineConfig::discover(None, dir.path()).unwrap();

    assert!(loaded.path.is_none());
    assert_eq!(loaded.config, PipelineConfig::default());
}

#[test]
fn discover_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = PipelineConfig::discover(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn cli_overrides_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), SAMPLE).unwrap();
    let loaded = PipelineConfig::discover(None, dir.path()).unwrap();

    let cli = Overrides {
        destination: Some("cli:/dest/".into()),
        vars: vec![("source".into(), "cli.md".into())],
        ..Overrides::default()
    };
    let env = Overrides {
        working_dir: Some(PathBuf::from("/env/workdir")),
        destination: Some("env:/dest/".into()),
        vars: Vec::new(),
    };

    let ctx = cli.or(env).run_context(&loaded, dir.path());

    assert_eq!(ctx.working_dir(), Path::new("/env/workdir"));
    assert_eq!(ctx.destination(), Some("cli:/dest/"));
    assert_eq!(ctx.var("source").as_deref(), Some("cli.md"));
}

#[test]
fn file_values_used_without_overrides() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE),
        format!("working_dir = \"site\"\n{SAMPLE}"),
    )
    .unwrap();
    let loaded = PipelineConfig::discover(None, dir.path()).unwrap();

    let ctx = Overrides::default().run_context(&loaded, Path::new("/unused"));

    assert_eq!(ctx.working_dir(), dir.path().join("site"));
    assert_eq!(ctx.destination(), Some("teach.example.org:/srv/www/lecture-03/"));
    assert_eq!(ctx.var("source").as_deref(), Some("lecture.md"));
}

#[test]
fn builtin_pipeline_has_no_destination() {
    let loaded = PipelineConfig::discover(None, TempDir::new().unwrap().path()).unwrap();
    let ctx = Overrides::default().run_context(&loaded, Path::new("/deck"));

    assert_eq!(ctx.working_dir(), Path::new("/deck"));
    assert_eq!(ctx.destination(), None);
}

#[test]
fn parses_assignments() {
    assert_eq!(
        parse_assignment("source=intro.md").unwrap(),
        ("source".to_string(), "intro.md".to_string())
    );
    assert_eq!(
        parse_assignment("flags=a=b").unwrap(),
        ("flags".to_string(), "a=b".to_string())
    );
    assert!(parse_assignment("novalue").is_err());
    assert!(parse_assignment("=x").is_err());
}

#[test]
fn demo_config_builds() {
    let demo = include_str!("../../../demos/deckflow.toml");
    let config = PipelineConfig::from_toml_str(demo, Path::new("demos/deckflow.toml")).unwrap();
    let pipeline = config.build_pipeline(Arc::new(NoOpEventSink)).unwrap();

    assert_eq!(pipeline.targets(), vec!["render", "deck", "publish", "web", "cleanup", "clean", "all"]);
    assert_eq!(pipeline.get("web").unwrap().summary(), "Sync the working directory to {dest}");
}
