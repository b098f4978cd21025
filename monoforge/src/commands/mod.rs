//! Command implementations for the CLI.

mod graph;
mod info;
mod run;
mod synth;

use std::path::Path;

use anyhow::{Context, Result};
use monoforge_adapters::get_adapter;
use monoforge_core::{Monorepo, MonorepoConfig};

pub use graph::cmd_graph;
pub use info::cmd_tasks;
pub use run::{cmd_run_many, cmd_run_task, RunManyArgs};
pub use synth::cmd_synth;

/// Loads `monoforge.toml` from `root` and builds the workspace it describes.
fn load_monorepo(root: &Path) -> Result<Monorepo> {
    let config = MonorepoConfig::load(root)
        .with_context(|| format!("Failed to load workspace configuration from {}", root.display()))?;
    let monorepo = Monorepo::from_config(&config, get_adapter)?;
    Ok(monorepo)
}
