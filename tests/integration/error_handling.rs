// tests/integration/error_handling.rs

use std::io::Write;
use tempfile::NamedTempFile;
use sitepipe::config::{load_and_validate, ConfigFile};
use sitepipe::dag::builtin;
use sitepipe::errors::SitepipeError;
use sitepipe::types::TaskKind;
use sitepipe_test_utils::{ConfigFileBuilder, SiteFixture};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let result = sitepipe::dag::TaskGraph::builder()
        .task("A", TaskKind::Composite, &["B"])
        .task("B", TaskKind::Composite, &["A"])
        .build();

    match result {
        Err(SitepipeError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_prerequisite_returns_task_not_found() {
    let result = sitepipe::dag::TaskGraph::builder()
        .task("A", TaskKind::Composite, &["NonExistent"])
        .build();

    match result {
        Err(SitepipeError::TaskNotFound(msg)) => assert!(msg.contains("NonExistent")),
        Err(e) => panic!("Expected TaskNotFound, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_task_is_rejected_before_running() {
    let graph = builtin::default_graph().unwrap();
    assert!(matches!(
        graph.ensure_task("minify"),
        Err(SitepipeError::TaskNotFound(name)) if name.contains("minify")
    ));
    graph.ensure_task(builtin::resolve_alias("sass")).unwrap();
}

#[test]
fn test_zero_queue_length_returns_config_error() {
    let file = config_file(
        r#"
[config]
queue_length = 0
"#,
    );

    match load_and_validate(file.path()) {
        Err(SitepipeError::ConfigError(msg)) => assert!(msg.contains("queue_length")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_key_returns_toml_error() {
    let file = config_file(
        r#"
[server]
prot = 8080
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(SitepipeError::TomlError(_))
    ));
}

#[test]
fn test_nested_src_and_dest_are_rejected() {
    let file = config_file(
        r#"
[paths]
src = "site"
dest = "site/out"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(SitepipeError::ConfigError(_))
    ));
}

#[tokio::test]
async fn test_missing_source_dir_fails_the_task() {
    let site = SiteFixture::new();
    std::fs::remove_dir_all(site.root().join("src/public/fonts")).unwrap();

    let cfg: ConfigFile = ConfigFileBuilder::new().build();
    let graph = builtin::default_graph().unwrap();
    let result = sitepipe::build(&cfg, &site.layout(), &graph, builtin::FONTS).await;

    match result {
        Err(SitepipeError::TaskFailed(tasks)) => assert_eq!(tasks, vec![builtin::FONTS]),
        other => panic!("Expected TaskFailed, got: {:?}", other),
    }
}
