//! Replacement of lifecycle task bodies with batch-runner delegations.
//!
//! An override is a one-way state transition on a [`Task`](crate::task::Task):
//! the task must already exist, and afterwards it holds exactly one step that
//! runs `run-many` for its target. Repeating the same override is a no-op.

use tracing::debug;

use crate::error::{Error, Result};
use crate::project::Project;
use crate::run_many::{RunManyComposer, RunManyOptions};
use crate::task::{TaskCapture, BUILD, LIFECYCLE_TASKS};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideOptions {
    /// Make the runner skip its cache for this target.
    pub force: bool,
}

impl OverrideOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// Which projects a captured task runs its target for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideScope {
    /// Every project of the workspace; used for the workspace root.
    Workspace,
    /// Only the project that owns the task.
    Project,
}

/// Captures `task_name` on `project` so it delegates to `run-many --target=<target>`.
///
/// Returns `false` if the task was already captured with identical settings.
///
/// # Errors
///
/// Returns an error if the task does not exist, or if it was captured
/// before with a different target or force setting.
pub fn override_task(
    composer: &RunManyComposer,
    project: &mut Project,
    scope: OverrideScope,
    task_name: &str,
    target: &str,
    options: OverrideOptions,
) -> Result<bool> {
    let mut run_options = RunManyOptions::new(target).forced(options.force);
    if scope == OverrideScope::Project {
        run_options.projects = vec![project.name.clone()];
    }
    let command = composer.command_line(&run_options);
    let project_name = project.name.clone();

    let task = project.require_task_mut(task_name)?;
    let capture = TaskCapture {
        target: target.to_string(),
        force: options.force,
    };

    match task.capture() {
        Some(existing) if *existing == capture => return Ok(false),
        Some(_) => {
            return Err(Error::TaskAlreadyOverridden {
                project: project_name,
                task: task_name.to_string(),
            })
        }
        None => {}
    }

    task.replace_with_capture(command, capture, scope == OverrideScope::Workspace);
    debug!(project = %project_name, task = task_name, target, force = options.force, "captured task");
    Ok(true)
}

/// Captures every standard lifecycle task the project defines.
///
/// `build` is captured with `force_build`; the other tasks never force.
/// Returns the number of tasks newly captured.
pub fn capture_lifecycle(
    composer: &RunManyComposer,
    project: &mut Project,
    scope: OverrideScope,
    force_build: bool,
) -> Result<usize> {
    let mut captured = 0;

    if project.task(BUILD).is_some()
        && override_task(
            composer,
            project,
            scope,
            BUILD,
            BUILD,
            OverrideOptions { force: force_build },
        )?
    {
        captured += 1;
    }

    for task_name in LIFECYCLE_TASKS {
        if project.task(task_name).is_some()
            && override_task(
                composer,
                project,
                scope,
                task_name,
                task_name,
                OverrideOptions::default(),
            )?
        {
            captured += 1;
        }
    }

    Ok(captured)
}
