use std::fs;
use std::path::Path;

use monoforge_core::adapter::{EcosystemAdapter, ManifestPin};
use monoforge_core::config::{MonorepoConfig, CONFIG_FILE, DEFAULT_ENGINE};
use monoforge_core::error::{Error, Result};
use monoforge_core::graph::EdgeKind;
use monoforge_core::project::{DependencyKind, Language, Project};
use monoforge_core::task::{TaskStep, COMPILE};
use monoforge_core::Monorepo;
use tempfile::TempDir;

/// Writes the engine pin to a plain-text manifest.
struct PinFileAdapter;

impl EcosystemAdapter for PinFileAdapter {
    fn manifest_file(&self) -> &'static str {
        "pin.txt"
    }

    fn lifecycle_commands(&self) -> &'static [(&'static str, &'static str)] {
        &[("compile", "echo compile")]
    }

    fn read_pin(&self, path: &Path, _tool: &str) -> Result<Option<ManifestPin>> {
        let version = fs::read_to_string(path.join("pin.txt"))?;
        Ok(Some(ManifestPin::new(version.trim(), DependencyKind::Dev)))
    }

    fn write_manifest(&self, project: &Project, path: &Path) -> Result<()> {
        let pin = project.pinned_version(DEFAULT_ENGINE).unwrap_or("none");
        fs::write(path.join("pin.txt"), pin)?;
        Ok(())
    }
}

fn adapter_for(_language: &Language) -> Box<dyn EcosystemAdapter> {
    Box::new(PinFileAdapter)
}

const CONFIG: &str = r#"
[workspace]
name = "acme"
package_manager = "true"
engine_version = "0.80.0"
default_parallel = 3

[[project]]
name = "types"
language = "ts"
outdir = "packages/types"

[[project]]
name = "client"
language = "python"
outdir = "packages/client"
implicit = ["types"]
package = ["types"]

[project.tasks]
compile = "echo extra"
lint = "ruff check"

[[project]]
name = "legacy"
language = "java"
outdir = "legacy"
managed = false
"#;

fn step_commands(project: &Project, task: &str) -> Vec<String> {
    project
        .task(task)
        .unwrap()
        .steps()
        .iter()
        .filter_map(|step| match step {
            TaskStep::Exec { command, .. } => Some(command.clone()),
            TaskStep::Spawn { .. } => None,
        })
        .collect()
}

#[test]
fn test_parse_config() {
    let config = MonorepoConfig::parse(CONFIG, "/tmp/acme").unwrap();
    assert_eq!(config.workspace.name, "acme");
    assert_eq!(config.workspace.engine, "projen");
    assert_eq!(config.workspace.runner, vec!["npx", "nx"]);
    assert_eq!(config.workspace.default_parallel, Some(3));
    assert_eq!(config.projects.len(), 3);
    assert!(config.projects[0].managed);
    assert!(!config.projects[2].managed);
    let tasks: Vec<_> = config.projects[1].tasks.keys().collect();
    assert_eq!(tasks, vec!["compile", "lint"]);
}

#[test]
fn test_parse_config_defaults() {
    let config = MonorepoConfig::parse("", ".").unwrap();
    assert_eq!(config.workspace.name, "monorepo");
    assert_eq!(config.workspace.default_branch, "main");
    assert_eq!(config.workspace.package_manager, "npm");
    assert!(config.projects.is_empty());
    assert_eq!(
        config.workspace.runner_packages().keys().next().map(String::as_str),
        Some("nx")
    );
}

#[test]
fn test_load_reports_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(CONFIG_FILE), "[workspace\n").unwrap();
    let err = MonorepoConfig::load(temp_dir.path()).unwrap_err();
    assert!(matches!(err, Error::Toml { .. }));
    assert!(err.to_string().contains(CONFIG_FILE));
}

#[test]
fn test_monorepo_from_config() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(CONFIG_FILE), CONFIG).unwrap();
    let client_dir = temp_dir.path().join("packages/client");
    fs::create_dir_all(&client_dir).unwrap();
    fs::write(client_dir.join("pin.txt"), "0.70.0").unwrap();

    let config = MonorepoConfig::load(temp_dir.path()).unwrap();
    let mut monorepo = Monorepo::from_config(&config, adapter_for).unwrap();

    let graph = monorepo.graph();
    let types = graph.resolve("types").unwrap();
    let client = graph.resolve("client").unwrap();
    let legacy = graph.resolve("legacy").unwrap();

    let client_project = graph.get(client).unwrap();
    assert_eq!(
        step_commands(client_project, COMPILE),
        vec!["echo compile", "echo extra"]
    );
    assert_eq!(step_commands(client_project, "lint"), vec!["ruff check"]);
    assert_eq!(client_project.pinned_version("projen"), Some("0.70.0"));
    assert_eq!(
        graph.get(types).unwrap().pinned_version("projen"),
        Some("0.80.0")
    );
    assert!(graph.get(legacy).unwrap().dependency("projen").is_none());

    let kinds: Vec<_> = graph
        .edges()
        .iter()
        .filter(|e| e.dependent == client && e.dependee == types)
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![EdgeKind::Implicit, EdgeKind::CrossEcosystemPackage]
    );

    monorepo.synth().unwrap();

    assert_eq!(fs::read_to_string(client_dir.join("pin.txt")).unwrap(), "0.80.0");
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("legacy/pin.txt")).unwrap(),
        "none"
    );
    let synced: Vec<_> = monorepo
        .synced_pins()
        .iter()
        .map(|p| p.project.as_str())
        .collect();
    assert_eq!(synced, vec!["client"]);
}

#[test]
fn test_from_config_unknown_dependency() {
    let config = MonorepoConfig::parse(
        r#"
[[project]]
name = "app"
language = "typescript"
outdir = "app"
implicit = ["ghost"]
"#,
        ".",
    )
    .unwrap();
    let result = Monorepo::from_config(&config, adapter_for);
    assert!(matches!(result, Err(Error::UnknownProject { ref name, .. }) if name == "ghost"));
}

#[test]
fn test_from_config_invalid_language() {
    let config = MonorepoConfig::parse(
        r#"
[[project]]
name = "app"
language = "cobol"
outdir = "app"
"#,
        ".",
    )
    .unwrap();
    let result = Monorepo::from_config(&config, adapter_for);
    let err = result.err().unwrap();
    assert!(err.to_string().contains("Invalid language: cobol"));
}

#[test]
fn test_from_config_duplicate_project_name() {
    let temp_dir = TempDir::new().unwrap();
    let config = MonorepoConfig::parse(
        r#"
[[project]]
name = "api"
language = "typescript"
outdir = "ts"

[[project]]
name = "api"
language = "java"
outdir = "java"
"#,
        temp_dir.path(),
    )
    .unwrap();

    let err = Monorepo::from_config(&config, adapter_for).err().unwrap();
    assert!(matches!(err, Error::DuplicateProject { ref name, .. } if name == "api"));
    let message = err.to_string();
    assert!(message.contains("typescript project at ts"));
    assert!(message.contains("java project at java"));
}
