//! TOML configuration for a generated monorepo (`monoforge.toml`).

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::project::Language;

pub const CONFIG_FILE: &str = "monoforge.toml";
pub const DEFAULT_ENGINE: &str = "projen";
pub const DEFAULT_ENGINE_VERSION: &str = "0.79.3";
pub const DEFAULT_RUNNER_VERSION: &str = "16.10.0";

fn default_name() -> String {
    "monorepo".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_engine() -> String {
    DEFAULT_ENGINE.to_string()
}

fn default_engine_version() -> String {
    DEFAULT_ENGINE_VERSION.to_string()
}

fn default_runner() -> Vec<String> {
    vec!["npx".to_string(), "nx".to_string()]
}

fn default_package_manager() -> String {
    "npm".to_string()
}

fn default_true() -> bool {
    true
}

fn default_root_language() -> String {
    "typescript".to_string()
}

/// Workspace-wide settings under `[workspace]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    #[serde(default = "default_name")]
    pub name: String,
    /// Language of the root project.
    #[serde(default = "default_root_language")]
    pub language: String,
    /// Base branch the runner compares against for affected projects.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Shared generation engine every subproject must pin identically.
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_engine_version")]
    pub engine_version: String,
    /// Program prefix that launches the batch runner.
    #[serde(default = "default_runner")]
    pub runner: Vec<String>,
    /// Package manager used to install the runner in the workspace root.
    #[serde(default = "default_package_manager")]
    pub package_manager: String,
    /// Runner plugins registered in the runner configuration.
    #[serde(default)]
    pub plugins: Vec<String>,
    /// Packages installed next to the runner, e.g. plugin packages.
    #[serde(default)]
    pub runner_dependencies: IndexMap<String, String>,
    /// Parallelism used when a run-many invocation does not set one.
    pub default_parallel: Option<usize>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            name: default_name(),
            language: default_root_language(),
            default_branch: default_branch(),
            engine: default_engine(),
            engine_version: default_engine_version(),
            runner: default_runner(),
            package_manager: default_package_manager(),
            plugins: Vec::new(),
            runner_dependencies: IndexMap::new(),
            default_parallel: None,
        }
    }
}

impl WorkspaceSettings {
    pub fn parse_language(&self) -> Result<Language> {
        parse_language(&self.name, &self.language)
    }

    /// Runner packages to install, with the runner itself first.
    pub fn runner_packages(&self) -> IndexMap<String, String> {
        let mut packages = IndexMap::new();
        packages.insert("nx".to_string(), DEFAULT_RUNNER_VERSION.to_string());
        for (name, version) in &self.runner_dependencies {
            packages.insert(name.clone(), version.clone());
        }
        packages
    }
}

/// One `[[project]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDefinition {
    pub name: String,
    pub language: String,
    /// Output directory relative to the workspace root.
    pub outdir: PathBuf,
    pub version: Option<String>,
    pub group: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the project is generated by the shared engine and pins it.
    #[serde(default = "default_true")]
    pub managed: bool,
    /// Generic implicit dependencies, by project name.
    #[serde(default)]
    pub implicit: Vec<String>,
    /// Dependencies wired into the shared native build toolchain.
    #[serde(default)]
    pub same_ecosystem: Vec<String>,
    /// Dependencies resolved through a local package reference.
    #[serde(default)]
    pub package: Vec<String>,
    /// Extra tasks, `name = "command"`, or commands appended to lifecycle tasks.
    #[serde(default)]
    pub tasks: IndexMap<String, String>,
}

impl ProjectDefinition {
    pub fn parse_language(&self) -> Result<Language> {
        parse_language(&self.name, &self.language)
    }
}

fn parse_language(project: &str, language: &str) -> Result<Language> {
    Language::from_str(language).ok_or_else(|| Error::Adapter {
        project: project.to_string(),
        message: format!(
            "Invalid language: {}. Supported languages: java, python, typescript, javascript",
            language
        ),
    })
}

/// Full contents of `monoforge.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonorepoConfig {
    #[serde(default)]
    pub workspace: WorkspaceSettings,
    #[serde(default, rename = "project")]
    pub projects: Vec<ProjectDefinition>,
    /// Directory the config was loaded from.
    #[serde(skip)]
    pub root_dir: PathBuf,
}

impl MonorepoConfig {
    /// Parses a configuration string; `root_dir` becomes the workspace root.
    pub fn parse(content: &str, root_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: MonorepoConfig = toml::from_str(content)?;
        config.root_dir = root_dir.into();
        Ok(config)
    }

    /// Loads `monoforge.toml` from `root_dir`.
    pub fn load(root_dir: &Path) -> Result<Self> {
        let path = root_dir.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path)?;
        toml::from_str::<MonorepoConfig>(&content)
            .map_err(|error| Error::Toml {
                error,
                context: path.display().to_string(),
            })
            .map(|mut config| {
                config.root_dir = root_dir.to_path_buf();
                config
            })
    }
}
