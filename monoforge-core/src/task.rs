//! Lifecycle tasks and their executable steps.

use serde::{Deserialize, Serialize};

pub const PRE_COMPILE: &str = "pre-compile";
pub const COMPILE: &str = "compile";
pub const POST_COMPILE: &str = "post-compile";
pub const TEST: &str = "test";
pub const PACKAGE: &str = "package";
pub const BUILD: &str = "build";

/// Standard lifecycle task names, in the order `build` spawns them.
pub const LIFECYCLE_TASKS: [&str; 5] = [PRE_COMPILE, COMPILE, POST_COMPILE, TEST, PACKAGE];

/// A single executable step of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStep {
    /// Runs a shell command in the project directory.
    Exec {
        command: String,
        /// Whether extra arguments given to the task are appended to the command.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        receive_args: bool,
    },
    /// Runs another task of the same project.
    Spawn { task: String },
}

/// The run-many delegation a task was captured with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCapture {
    pub target: String,
    pub force: bool,
}

/// A named, ordered list of steps belonging to one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    steps: Vec<TaskStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capture: Option<TaskCapture>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            steps: Vec::new(),
            capture: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a shell command step.
    pub fn exec(&mut self, command: impl Into<String>) -> &mut Self {
        self.steps.push(TaskStep::Exec {
            command: command.into(),
            receive_args: false,
        });
        self
    }

    /// Appends a step that runs another task.
    pub fn spawn(&mut self, task: impl Into<String>) -> &mut Self {
        self.steps.push(TaskStep::Spawn { task: task.into() });
        self
    }

    #[inline]
    pub fn steps(&self) -> &[TaskStep] {
        &self.steps
    }

    /// Returns the run-many delegation this task was captured with, if any.
    #[inline]
    pub fn capture(&self) -> Option<&TaskCapture> {
        self.capture.as_ref()
    }

    #[inline]
    pub fn is_captured(&self) -> bool {
        self.capture.is_some()
    }

    /// Replaces the whole step list with one delegating command.
    ///
    /// Workspace-wide captures get " for all affected projects" appended to
    /// the description.
    pub(crate) fn replace_with_capture(
        &mut self,
        command: String,
        capture: TaskCapture,
        workspace_wide: bool,
    ) {
        self.steps.clear();
        self.steps.push(TaskStep::Exec {
            command,
            receive_args: true,
        });
        if workspace_wide {
            let description = self.description.take().unwrap_or_else(|| self.name.clone());
            self.description = Some(format!("{} for all affected projects", description));
        }
        self.capture = Some(capture);
    }
}
