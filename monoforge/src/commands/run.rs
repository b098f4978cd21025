//! Batch-runner and single-task execution.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use monoforge_core::{RunManyOptions, TaskRuntime};

use crate::formatting::{format_duration, print_key_value, print_section_header, print_success, SectionStyle};

use super::load_monorepo;

/// Command-line selection for one `run-many` invocation.
#[derive(Debug, Default)]
pub struct RunManyArgs {
    pub target: String,
    pub projects: Vec<String>,
    pub exclude: Vec<String>,
    pub parallel: Option<usize>,
    pub configuration: Option<String>,
    pub force: bool,
    pub no_bail: bool,
    pub verbose: bool,
    pub extra_args: Vec<String>,
}

impl From<RunManyArgs> for RunManyOptions {
    fn from(args: RunManyArgs) -> Self {
        RunManyOptions {
            target: args.target,
            projects: args.projects,
            exclude: args.exclude,
            parallel: args.parallel,
            configuration: args.configuration,
            force: args.force,
            no_bail: args.no_bail,
            verbose: args.verbose,
            extra_args: args.extra_args,
            ..Default::default()
        }
    }
}

pub fn cmd_run_many(root: PathBuf, args: RunManyArgs, dry_run: bool) -> Result<()> {
    let monorepo = load_monorepo(&root)?;
    let options = RunManyOptions::from(args);

    if dry_run {
        println!(
            "{}",
            monorepo.orchestrator().composer().command_line(&options)
        );
        return Ok(());
    }

    let start = Instant::now();
    print_section_header(&format!("Running '{}'", options.target), SectionStyle::Primary);
    monorepo.exec_run_many_command(&options)?;

    println!();
    print_success(&format!("Target '{}' completed", options.target));
    print_key_value(
        "Duration:",
        &format_duration(start.elapsed().as_secs_f64()),
    );
    println!();
    Ok(())
}

pub fn cmd_run_task(root: PathBuf, project: Option<String>, task: String, args: Vec<String>) -> Result<()> {
    let monorepo = load_monorepo(&root)?;
    let graph = monorepo.graph();
    let project = match project {
        Some(name) => graph.get(graph.resolve(&name)?)?,
        None => graph.root(),
    };

    let runtime = TaskRuntime::new(monorepo.root_dir());
    runtime.run_task(project, &task, &args)?;
    print_success(&format!("{}::{} completed", project.name, task));
    Ok(())
}
