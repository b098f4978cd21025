//! Batch runner configuration files emitted during synthesis.
//!
//! The runner owns the schema; only the keys this layer manages are written,
//! and existing files are merged rather than replaced where that matters.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::graph::WorkspaceGraph;
use crate::process::shell_quote;
use crate::project::{Project, ProjectId};
use crate::task::{Task, TaskStep, BUILD};

pub const RUNNER_CONFIG_FILE: &str = "nx.json";
pub const PROJECT_CONFIG_FILE: &str = "project.json";
pub const TASKS_FILE: &str = ".monoforge/tasks.json";
pub const RUNNER_MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedConfig {
    pub default_base: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDefault {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// Graph entry of one project inside the runner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub root: String,
    #[serde(default)]
    pub implicit_dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Workspace-level runner configuration (`nx.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    pub extends: String,
    pub npm_scope: String,
    pub affected: AffectedConfig,
    #[serde(default)]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub target_defaults: IndexMap<String, TargetDefault>,
    #[serde(default)]
    pub projects: IndexMap<String, ProjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetOptions {
    pub command: String,
    pub cwd: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfig {
    pub executor: String,
    pub options: TargetOptions,
}

/// Per-project runner configuration (`project.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub name: String,
    pub root: String,
    #[serde(default)]
    pub implicit_dependencies: Vec<String>,
    #[serde(default)]
    pub targets: IndexMap<String, TargetConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn root_string(project: &Project) -> String {
    let root = project.outdir.to_string_lossy().replace('\\', "/");
    if root.is_empty() {
        ".".to_string()
    } else {
        root
    }
}

fn implicit_dependency_names(graph: &WorkspaceGraph, id: ProjectId) -> Vec<String> {
    graph
        .dependencies_of(id)
        .into_iter()
        .filter_map(|dep| graph.get(dep).ok().map(|p| p.name.clone()))
        .collect()
}

impl RunnerConfig {
    /// Builds the runner configuration for every subproject of `graph`.
    pub fn from_graph(graph: &WorkspaceGraph, default_branch: &str, plugins: &[String]) -> Self {
        let mut target_defaults = IndexMap::new();
        target_defaults.insert(
            BUILD.to_string(),
            TargetDefault {
                depends_on: vec![format!("^{}", BUILD)],
            },
        );

        let projects = graph
            .subprojects()
            .map(|(id, project)| {
                (
                    project.name.clone(),
                    ProjectEntry {
                        root: root_string(project),
                        implicit_dependencies: implicit_dependency_names(graph, id),
                        tags: project.tags.clone(),
                    },
                )
            })
            .collect();

        Self {
            extends: "nx/presets/npm.json".to_string(),
            npm_scope: graph.root().name.clone(),
            affected: AffectedConfig {
                default_base: default_branch.to_string(),
            },
            plugins: plugins.to_vec(),
            target_defaults,
            projects,
        }
    }
}

impl ProjectConfig {
    /// Builds `project.json` for one project; captured tasks get no target
    /// since they already delegate back to the runner.
    pub fn from_project(graph: &WorkspaceGraph, id: ProjectId) -> Result<Self> {
        let project = graph.get(id)?;
        let targets = project
            .tasks()
            .filter(|task| !task.is_captured())
            .filter_map(|task| {
                render_task_command(project, &task.name).map(|command| {
                    (
                        task.name.clone(),
                        TargetConfig {
                            executor: "nx:run-commands".to_string(),
                            options: TargetOptions {
                                command,
                                cwd: root_string(project),
                            },
                        },
                    )
                })
            })
            .collect();

        Ok(Self {
            name: project.name.clone(),
            root: root_string(project),
            implicit_dependencies: implicit_dependency_names(graph, id),
            targets,
            tags: project.tags.clone(),
        })
    }
}

/// Full task definitions of one project (`.monoforge/tasks.json`).
#[derive(Debug, Serialize)]
pub struct TasksManifest<'a> {
    pub tasks: IndexMap<&'a str, &'a Task>,
}

impl<'a> From<&'a Project> for TasksManifest<'a> {
    fn from(project: &'a Project) -> Self {
        Self {
            tasks: project.tasks().map(|t| (t.name.as_str(), t)).collect(),
        }
    }
}

/// Flattens a task and the tasks it spawns into one `&&`-joined command.
///
/// Returns `None` for tasks without any command. Spawn cycles are cut.
pub fn render_task_command(project: &Project, task_name: &str) -> Option<String> {
    fn collect(
        project: &Project,
        task_name: &str,
        visiting: &mut HashSet<String>,
        commands: &mut Vec<String>,
    ) {
        if !visiting.insert(task_name.to_string()) {
            return;
        }
        if let Some(task) = project.task(task_name) {
            for step in task.steps() {
                match step {
                    TaskStep::Exec { command, .. } => commands.push(command.clone()),
                    TaskStep::Spawn { task } => collect(project, task, visiting, commands),
                }
            }
        }
        visiting.remove(task_name);
    }

    let mut commands = Vec::new();
    collect(project, task_name, &mut HashSet::new(), &mut commands);
    if commands.is_empty() {
        None
    } else {
        Some(commands.join(" && "))
    }
}

/// Serializes `value` as pretty JSON with a trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

/// Merges the runner and its plugins into the root `package.json`
/// `devDependencies`, keeping every other key.
pub fn write_runner_manifest(
    path: &Path,
    workspace_name: &str,
    runner_dependencies: &IndexMap<String, String>,
) -> Result<()> {
    let mut manifest: Value = if path.exists() {
        serde_json::from_str(&fs::read_to_string(path)?)?
    } else {
        Value::Object(Map::new())
    };

    if !manifest.is_object() {
        manifest = Value::Object(Map::new());
    }
    if let Value::Object(ref mut root) = manifest {
        root.entry("name")
            .or_insert_with(|| Value::String(workspace_name.to_string()));
        root.insert("private".to_string(), Value::Bool(true));

        let dev = root
            .entry("devDependencies")
            .or_insert_with(|| Value::Object(Map::new()));
        if !dev.is_object() {
            *dev = Value::Object(Map::new());
        }
        if let Value::Object(ref mut dev) = dev {
            for (name, version) in runner_dependencies {
                dev.insert(name.clone(), Value::String(version.clone()));
            }
        }
    }

    write_json(path, &manifest)
}

/// Command that installs the runner's own dependencies in the workspace root.
pub fn install_command(package_manager: &str) -> String {
    format!("{} install", shell_quote(package_manager))
}
