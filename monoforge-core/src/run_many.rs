//! Composition and execution of batch-runner `run-many` invocations.

use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::process::{join_command, run_streaming};
use crate::project::Project;
use crate::task::{Task, TaskStep};

pub const DEFAULT_OUTPUT_STYLE: &str = "stream";

/// Options of one `run-many` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunManyOptions {
    /// Target to run in every selected project, e.g. `build`.
    pub target: String,
    /// Projects to run; empty selects every project of the workspace.
    pub projects: Vec<String>,
    /// Projects to leave out.
    pub exclude: Vec<String>,
    /// Maximum concurrently running targets.
    pub parallel: Option<usize>,
    /// Named target configuration.
    pub configuration: Option<String>,
    /// Named task runner from the runner configuration.
    pub runner: Option<String>,
    /// Ignore the runner's cache and always re-execute.
    pub force: bool,
    pub ignore_cycles: bool,
    /// Keep running other projects after a failure.
    pub no_bail: bool,
    pub output_style: Option<String>,
    pub verbose: bool,
    /// Passed through to every target after `--`.
    pub extra_args: Vec<String>,
}

impl RunManyOptions {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projects = projects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = Some(parallel);
        self
    }

    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = Some(configuration.into());
        self
    }

    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Builds `run-many` command lines for the workspace batch runner.
#[derive(Debug, Clone)]
pub struct RunManyComposer {
    workspace_root: PathBuf,
    runner_command: Vec<String>,
    default_parallel: Option<usize>,
}

impl RunManyComposer {
    /// Creates a composer.
    ///
    /// `runner_command` is the program prefix that launches the runner,
    /// e.g. `["npx", "nx"]`.
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        runner_command: Vec<String>,
        default_parallel: Option<usize>,
    ) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            runner_command,
            default_parallel,
        }
    }

    /// Composes the runner arguments for `options`.
    ///
    /// Deterministic: identical options always produce identical tokens.
    /// Without an explicit or workspace-wide parallelism the flag is omitted
    /// and the runner falls back to its own worker count.
    pub fn compose_run_many_command(&self, options: &RunManyOptions) -> Vec<String> {
        let mut args = vec![
            "run-many".to_string(),
            format!("--target={}", options.target),
            format!(
                "--output-style={}",
                options.output_style.as_deref().unwrap_or(DEFAULT_OUTPUT_STYLE)
            ),
        ];

        if let Some(ref configuration) = options.configuration {
            args.push(format!("--configuration={}", configuration));
        }
        if let Some(ref runner) = options.runner {
            args.push(format!("--runner={}", runner));
        }
        if let Some(parallel) = options.parallel.or(self.default_parallel) {
            args.push(format!("--parallel={}", parallel));
        }
        if options.force {
            args.push("--skip-nx-cache".to_string());
        }
        if options.ignore_cycles {
            args.push("--nx-ignore-cycles".to_string());
        }
        if !options.no_bail {
            args.push("--nx-bail".to_string());
        }
        if !options.projects.is_empty() {
            args.push(format!("--projects={}", options.projects.join(",")));
        }
        if !options.exclude.is_empty() {
            args.push(format!("--exclude={}", options.exclude.join(",")));
        }
        if options.verbose {
            args.push("--verbose".to_string());
        }
        if !options.extra_args.is_empty() {
            args.push("--".to_string());
            args.extend(options.extra_args.iter().cloned());
        }

        args
    }

    /// Full shell command line: runner prefix followed by the composed tokens.
    pub fn command_line(&self, options: &RunManyOptions) -> String {
        let mut tokens = self.runner_command.clone();
        tokens.extend(self.compose_run_many_command(options));
        join_command(&tokens)
    }

    /// Runs the composed command in the workspace root and returns its output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchRunFailure`] when the runner exits non-zero.
    pub fn exec_run_many_command(&self, options: &RunManyOptions) -> Result<String> {
        let (program, prefix_args) =
            self.runner_command
                .split_first()
                .ok_or_else(|| Error::TaskExecution {
                    project: "workspace".to_string(),
                    task: options.target.clone(),
                    message: "Batch runner command is empty".to_string(),
                })?;

        let mut command = Command::new(program);
        command
            .args(prefix_args)
            .args(self.compose_run_many_command(options))
            .current_dir(&self.workspace_root);

        info!(target_name = %options.target, "{}", self.command_line(options));
        let output = run_streaming(command, &options.target)?;

        if !output.success() {
            return Err(Error::BatchRunFailure {
                exit_code: output.exit_code,
                target: options.target.clone(),
            });
        }
        Ok(output.combined)
    }

    /// Registers a new task on `project` whose single step runs the composed
    /// command.
    ///
    /// # Errors
    ///
    /// Returns an error if the project already has a task called `name`.
    pub fn add_run_many_task<'a>(
        &self,
        project: &'a mut Project,
        name: &str,
        options: &RunManyOptions,
    ) -> Result<&'a Task> {
        let mut task = Task::new(name).with_description(format!(
            "Run target '{}' across the workspace graph",
            options.target
        ));
        task.exec(self.command_line(options));
        let task = project.add_task(task)?;
        Ok(task)
    }
}

/// Extracts the run-many command of a single-step task, if it has one.
pub fn delegated_command(task: &Task) -> Option<&str> {
    match task.steps() {
        [TaskStep::Exec { command, .. }] => Some(command.as_str()),
        _ => None,
    }
}
