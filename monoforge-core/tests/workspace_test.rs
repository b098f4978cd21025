use std::fs;

use monoforge_core::error::Error;
use monoforge_core::project::{Language, Project};
use monoforge_core::run_many::{delegated_command, RunManyOptions};
use monoforge_core::runner_config::{ProjectConfig, RunnerConfig};
use monoforge_core::task::BUILD;
use monoforge_core::{Monorepo, OverrideOptions, ProjectId, WorkspaceSettings, INSTALL_TASK};
use serde_json::Value;
use tempfile::TempDir;

fn settings() -> WorkspaceSettings {
    WorkspaceSettings {
        name: "acme".to_string(),
        package_manager: "true".to_string(),
        plugins: vec!["@nx/js".to_string()],
        ..Default::default()
    }
}

#[test]
fn test_end_to_end_synthesis() {
    let temp_dir = TempDir::new().unwrap();
    let mut monorepo = Monorepo::new(settings(), temp_dir.path()).unwrap();
    let a = monorepo
        .add_project(Project::new("A", Language::TypeScript, "packages/a"))
        .unwrap();
    let b = monorepo
        .add_project(Project::new("B", Language::Python, "packages/b"))
        .unwrap();
    monorepo.add_implicit_dependency(b, a).unwrap();

    monorepo.synth().unwrap();

    let content = fs::read_to_string(temp_dir.path().join("nx.json")).unwrap();
    let config: RunnerConfig = serde_json::from_str(&content).unwrap();
    let names: Vec<_> = config.projects.keys().cloned().collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(config.projects["B"].implicit_dependencies, vec!["A"]);
    assert!(config.projects["A"].implicit_dependencies.is_empty());
    assert_eq!(config.projects["A"].root, "packages/a");
    assert_eq!(config.plugins, vec!["@nx/js"]);
    assert_eq!(config.npm_scope, "acme");
    assert_eq!(config.target_defaults[BUILD].depends_on, vec!["^build"]);

    let tokens = monorepo.compose_run_many_command(&RunManyOptions::new("build"));
    assert_eq!(tokens[1], "--target=build");
    assert!(!tokens.iter().any(|t| t.contains("--projects")));
    assert!(!tokens.iter().any(|t| t == "A" || t == "B"));
}

#[test]
fn test_synthesized_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("package.json"),
        r#"{"name": "existing", "scripts": {"x": "y"}}"#,
    )
    .unwrap();

    let mut monorepo = Monorepo::new(settings(), temp_dir.path()).unwrap();
    monorepo
        .add_project(Project::new("A", Language::TypeScript, "packages/a"))
        .unwrap();
    monorepo.synth().unwrap();

    let manifest: Value = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join("package.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["name"], "existing");
    assert_eq!(manifest["scripts"]["x"], "y");
    assert_eq!(manifest["private"], true);
    assert!(manifest["devDependencies"]["nx"].is_string());

    let project_config: ProjectConfig = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join("packages/a/project.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(project_config.name, "A");
    // Lifecycle tasks without commands produce no targets.
    assert!(project_config.targets.is_empty());

    let tasks: Value = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join(".monoforge/tasks.json")).unwrap(),
    )
    .unwrap();
    let build = &tasks["tasks"]["build"];
    assert_eq!(build["capture"]["force"], true);
    assert!(tasks["tasks"][INSTALL_TASK]["steps"][0]["exec"]["command"]
        .as_str()
        .unwrap()
        .starts_with("true install"));
}

#[test]
fn test_root_lifecycle_is_captured() {
    let temp_dir = TempDir::new().unwrap();
    let monorepo = Monorepo::new(settings(), temp_dir.path()).unwrap();
    let root = monorepo.project(ProjectId::ROOT).unwrap();

    let build = delegated_command(root.task(BUILD).unwrap()).unwrap();
    assert_eq!(
        build,
        "npx nx run-many --target=build --output-style=stream --skip-nx-cache --nx-bail"
    );
    let test = delegated_command(root.task("test").unwrap()).unwrap();
    assert!(!test.contains("--skip-nx-cache"));
}

#[test]
fn test_override_subproject_task() {
    let temp_dir = TempDir::new().unwrap();
    let mut monorepo = Monorepo::new(settings(), temp_dir.path()).unwrap();
    let a = monorepo
        .add_project(Project::new("A", Language::TypeScript, "packages/a"))
        .unwrap();

    assert!(monorepo
        .override_task(a, "test", "test", OverrideOptions::default())
        .unwrap());
    let command = delegated_command(monorepo.project(a).unwrap().task("test").unwrap()).unwrap();
    assert!(command.contains("--projects=A"));

    let result = monorepo.override_task(a, "lint", "lint", OverrideOptions::default());
    assert!(matches!(result, Err(Error::UnknownTask { .. })));
}

#[test]
fn test_add_run_many_task_on_root() {
    let temp_dir = TempDir::new().unwrap();
    let mut monorepo = Monorepo::new(settings(), temp_dir.path()).unwrap();
    let options = RunManyOptions::new("lint").with_parallel(2);
    let task = monorepo.add_run_many_task("lint", &options).unwrap();
    assert_eq!(task.steps().len(), 1);
    assert!(monorepo.project(ProjectId::ROOT).unwrap().task("lint").is_some());
}

#[test]
fn test_invalid_engine_version() {
    let temp_dir = TempDir::new().unwrap();
    let settings = WorkspaceSettings {
        engine_version: "latest".to_string(),
        ..settings()
    };
    let result = Monorepo::new(settings, temp_dir.path());
    assert!(matches!(result, Err(Error::InvalidVersion { .. })));
}

#[test]
fn test_exec_run_many_failure_propagates() {
    let temp_dir = TempDir::new().unwrap();
    let settings = WorkspaceSettings {
        runner: ["sh", "-c", "exit 7", "sh"].map(String::from).to_vec(),
        ..settings()
    };
    let monorepo = Monorepo::new(settings, temp_dir.path()).unwrap();
    let result = monorepo.exec_run_many_command(&RunManyOptions::new("build"));
    assert!(matches!(
        result,
        Err(Error::BatchRunFailure { exit_code: 7, .. })
    ));
}
