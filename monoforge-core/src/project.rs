//! Project data models and language definitions.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{Task, BUILD, LIFECYCLE_TASKS};

/// Supported implementation languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Python,
    TypeScript,
    JavaScript,
}

/// Package ecosystems; languages in one ecosystem share a native toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Maven,
    Poetry,
    Node,
}

impl Language {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
        }
    }

    #[inline]
    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            Language::Java => Ecosystem::Maven,
            Language::Python => Ecosystem::Poetry,
            Language::TypeScript | Language::JavaScript => Ecosystem::Node,
        }
    }

    /// Parses a language string into a `Language` variant.
    ///
    /// Supports aliases (e.g., "ts" for "typescript", "py" for "python").
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "java" => Some(Language::Java),
            "python" | "py" => Some(Language::Python),
            "ts" | "typescript" => Some(Language::TypeScript),
            "js" | "javascript" => Some(Language::JavaScript),
            _ => None,
        }
    }
}

/// Stable handle of a project inside the workspace arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(pub(crate) usize);

impl ProjectId {
    /// The workspace root project always occupies the first arena slot.
    pub const ROOT: ProjectId = ProjectId(0);

    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Runtime,
    Dev,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencySpec {
    Version(String),
    /// Local reference, relative to the declaring project's output directory.
    Path(PathBuf),
}

/// A dependency declared in a project's package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub spec: DependencySpec,
    pub kind: DependencyKind,
}

/// A reference from one project's native build descriptor to another project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReference {
    pub project: String,
    pub group: Option<String>,
    pub version: String,
    /// Dependee output directory relative to the dependent's output directory.
    pub relative_path: PathBuf,
}

/// A buildable unit of the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub language: Language,
    /// Output directory relative to the workspace root.
    pub outdir: PathBuf,
    pub version: String,
    pub group: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    tasks: IndexMap<String, Task>,
    deps: IndexMap<String, Dependency>,
    build_refs: Vec<BuildReference>,
}

impl Project {
    /// Creates a project with the standard lifecycle tasks, all empty except
    /// `build`, which spawns the others in order.
    pub fn new(name: impl Into<String>, language: Language, outdir: impl Into<PathBuf>) -> Self {
        let mut tasks = IndexMap::new();
        for task_name in LIFECYCLE_TASKS {
            tasks.insert(task_name.to_string(), Task::new(task_name));
        }
        let mut build = Task::new(BUILD).with_description("Full release build");
        for task_name in LIFECYCLE_TASKS {
            build.spawn(task_name);
        }
        tasks.insert(BUILD.to_string(), build);

        Self {
            name: name.into(),
            language,
            outdir: outdir.into(),
            version: "0.0.0".to_string(),
            group: None,
            tags: Vec::new(),
            tasks,
            deps: IndexMap::new(),
            build_refs: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Short "<language> project at <outdir>" label used in messages.
    pub fn location(&self) -> String {
        format!("{} project at {}", self.language.as_str(), self.outdir.display())
    }

    #[inline]
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    #[inline]
    pub fn task_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.keys().map(|k| k.as_str()).collect()
    }

    /// Looks up a task or reports the available ones.
    pub fn require_task_mut(&mut self, name: &str) -> Result<&mut Task> {
        match self.tasks.get_index_of(name) {
            Some(idx) => Ok(&mut self.tasks[idx]),
            None => Err(Error::UnknownTask {
                project: self.name.clone(),
                task: name.to_string(),
                available: self.task_names().join(", "),
            }),
        }
    }

    /// Adds a new task.
    ///
    /// # Errors
    ///
    /// Returns an error if a task with the same name exists.
    pub fn add_task(&mut self, task: Task) -> Result<&mut Task> {
        if self.tasks.contains_key(&task.name) {
            return Err(Error::TaskExists {
                project: self.name.clone(),
                task: task.name,
            });
        }
        let name = task.name.clone();
        Ok(self.tasks.entry(name).or_insert(task))
    }

    #[inline]
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.deps.get(name)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.deps.values()
    }

    /// Declares or replaces a manifest dependency.
    pub fn add_dependency(&mut self, dependency: Dependency) {
        self.deps.insert(dependency.name.clone(), dependency);
    }

    pub fn add_version_dependency(
        &mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        kind: DependencyKind,
    ) {
        self.add_dependency(Dependency {
            name: name.into(),
            spec: DependencySpec::Version(version.into()),
            kind,
        });
    }

    /// Returns the pinned version of `tool`, if the project declares it.
    pub fn pinned_version(&self, tool: &str) -> Option<&str> {
        match self.deps.get(tool).map(|d| &d.spec) {
            Some(DependencySpec::Version(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Overwrites the version of an already declared dependency.
    ///
    /// Returns the previous version when the dependency existed.
    pub(crate) fn repin(&mut self, tool: &str, version: &str) -> Option<DependencySpec> {
        let dep = self.deps.get_mut(tool)?;
        let previous = std::mem::replace(&mut dep.spec, DependencySpec::Version(version.to_string()));
        Some(previous)
    }

    pub fn build_references(&self) -> &[BuildReference] {
        &self.build_refs
    }

    /// Records a native build reference; returns `false` if it was already present.
    pub(crate) fn add_build_reference(&mut self, reference: BuildReference) -> bool {
        if self.build_refs.iter().any(|r| r.project == reference.project) {
            return false;
        }
        self.build_refs.push(reference);
        true
    }
}

/// Computes `to` relative to `from`, both relative to the same root.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component> = to.components().filter(|c| *c != Component::CurDir).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..from.len() {
        result.push("..");
    }
    for component in &to[common..] {
        result.push(component.as_os_str());
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}
