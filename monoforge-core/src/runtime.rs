//! Sequential execution of project tasks.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::error::{Error, Result};
use crate::process::{join_command, run_streaming};
use crate::project::Project;
use crate::task::TaskStep;

/// Runs a project's task steps in the project directory, one after another.
pub struct TaskRuntime {
    workspace_root: PathBuf,
}

impl TaskRuntime {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    /// Runs `task_name`, spawning nested tasks depth-first.
    ///
    /// `args` are appended to commands that receive arguments, in the
    /// top-level task only.
    ///
    /// # Errors
    ///
    /// Returns an error if a task is missing, spawns form a cycle, or a
    /// command exits non-zero.
    pub fn run_task(&self, project: &Project, task_name: &str, args: &[String]) -> Result<()> {
        let cwd = self.workspace_root.join(&project.outdir);
        let mut visiting = HashSet::new();
        self.visit(project, task_name, args, &cwd, &mut visiting)
    }

    fn visit(
        &self,
        project: &Project,
        task_name: &str,
        args: &[String],
        cwd: &Path,
        visiting: &mut HashSet<String>,
    ) -> Result<()> {
        if !visiting.insert(task_name.to_string()) {
            return Err(Error::TaskExecution {
                project: project.name.clone(),
                task: task_name.to_string(),
                message: format!("Circular task spawn detected involving '{}'", task_name),
            });
        }

        let task = project.task(task_name).ok_or_else(|| Error::UnknownTask {
            project: project.name.clone(),
            task: task_name.to_string(),
            available: project.task_names().join(", "),
        })?;

        for step in task.steps() {
            match step {
                TaskStep::Exec {
                    command,
                    receive_args,
                } => {
                    let mut line = command.clone();
                    if *receive_args && !args.is_empty() {
                        line.push(' ');
                        line.push_str(&join_command(args));
                    }
                    self.exec(project, task_name, &line, cwd)?;
                }
                TaskStep::Spawn { task } => self.visit(project, task, &[], cwd, visiting)?,
            }
        }

        visiting.remove(task_name);
        Ok(())
    }

    fn exec(&self, project: &Project, task_name: &str, line: &str, cwd: &Path) -> Result<()> {
        info!(project = %project.name, task = task_name, "{}", line);
        let mut command = Command::new("sh");
        command.arg("-c").arg(line).current_dir(cwd);

        let output = run_streaming(command, &project.name).map_err(|e| Error::TaskExecution {
            project: project.name.clone(),
            task: task_name.to_string(),
            message: format!("Failed to execute '{}': {}", line, e),
        })?;

        if !output.success() {
            return Err(Error::TaskExecution {
                project: project.name.clone(),
                task: task_name.to_string(),
                message: format!("'{}' exited with code {}", line, output.exit_code),
            });
        }
        Ok(())
    }
}
