mod commands;
mod formatting;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use commands::RunManyArgs;
use formatting::print_error;

#[derive(Parser)]
#[command(name = "monoforge")]
#[command(about = "Polyglot monorepo generator driven by one graph-aware batch runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root containing monoforge.toml.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, action)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate runner configuration and manifests, then install the runner.
    Synth,
    Graph {
        #[arg(long, action)]
        json: bool,
    },
    /// Run a target across the workspace through the batch runner.
    RunMany {
        target: String,
        #[arg(short, long, value_delimiter = ',')]
        projects: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
        #[arg(short = 'j', long)]
        parallel: Option<usize>,
        #[arg(short, long)]
        configuration: Option<String>,
        /// Skip the runner cache.
        #[arg(long, action)]
        force: bool,
        #[arg(long, action)]
        no_bail: bool,
        /// Print the composed command instead of running it.
        #[arg(long, action)]
        dry_run: bool,
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Run one task of one project directly, without the batch runner.
    RunTask {
        task: String,
        #[arg(short, long)]
        project: Option<String>,
        #[arg(last = true)]
        args: Vec<String>,
    },
    Tasks {
        project: Option<String>,
        #[arg(long, action)]
        json: bool,
    },
}

fn run(cli: Cli) -> Result<()> {
    let verbose = cli.verbose > 0;
    match cli.command {
        Commands::Synth => commands::cmd_synth(cli.root, cli.quiet)?,
        Commands::Graph { json } => commands::cmd_graph(cli.root, json)?,
        Commands::RunMany {
            target,
            projects,
            exclude,
            parallel,
            configuration,
            force,
            no_bail,
            dry_run,
            args,
        } => commands::cmd_run_many(
            cli.root,
            RunManyArgs {
                target,
                projects,
                exclude,
                parallel,
                configuration,
                force,
                no_bail,
                verbose,
                extra_args: args,
            },
            dry_run,
        )?,
        Commands::RunTask {
            task,
            project,
            args,
        } => commands::cmd_run_task(cli.root, project, task, args)?,
        Commands::Tasks { project, json } => commands::cmd_tasks(cli.root, project, json)?,
    }
    Ok(())
}

/// Batch-runner failures exit with the runner's own code.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<monoforge_core::Error>() {
        Some(monoforge_core::Error::BatchRunFailure { exit_code, .. }) => {
            ExitCode::from(u8::try_from(*exit_code).unwrap_or(1))
        }
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&format!("{:#}", err));
            exit_code(&err)
        }
    }
}
