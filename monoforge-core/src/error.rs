//! Error types and result aliases.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Project not found: {name}. Registered projects: {available}")]
    UnknownProject { name: String, available: String },

    #[error("Project {name} is already registered as a {existing}; cannot register a {requested} with the same name")]
    DuplicateProject {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("Task '{task}' is not defined on project {project}. Available tasks: {available}")]
    UnknownTask {
        project: String,
        task: String,
        available: String,
    },

    #[error("Task '{task}' already exists on project {project}")]
    TaskExists { project: String, task: String },

    #[error(
        "Task '{task}' on project {project} was already overridden with a different run-many target"
    )]
    TaskAlreadyOverridden { project: String, task: String },

    #[error("Cannot {operation}: the workspace graph is frozen after pre-synthesis")]
    GraphFrozen { operation: String },

    #[error("Project {0} cannot depend on itself")]
    SelfDependency(String),

    #[error("Projects {dependent} ({dependent_language}) and {dependee} ({dependee_language}) do not share an ecosystem")]
    EcosystemMismatch {
        dependent: String,
        dependent_language: String,
        dependee: String,
        dependee_language: String,
    },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Batch run of target '{target}' failed with exit code {exit_code}")]
    BatchRunFailure { exit_code: i32, target: String },

    #[error("Installing the batch runner failed in task '{task}': {message}. Re-run synthesis once the cause is fixed.")]
    InstallFailure { task: String, message: String },

    #[error("Lifecycle phase '{requested}' cannot run while the workspace is {current}")]
    PhaseOrder { requested: String, current: String },

    #[error("Invalid version '{version}' for {tool}: {message}")]
    InvalidVersion {
        tool: String,
        version: String,
        message: String,
    },

    #[error("Task execution failed for {project}::{task}: {message}")]
    TaskExecution {
        project: String,
        task: String,
        message: String,
    },

    #[error("Adapter error for {project}: {message}")]
    Adapter { project: String, message: String },
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Toml {
            error,
            context: "monoforge.toml".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
