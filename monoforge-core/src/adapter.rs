//! Ecosystem adapter trait for reading and writing native package manifests.

use std::path::Path;

use crate::error::Result;
use crate::lifecycle::{HookContext, SynthHook};
use crate::project::{DependencyKind, Project};

/// A tool version found in an existing manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPin {
    pub version: String,
    pub kind: DependencyKind,
}

impl ManifestPin {
    pub fn new(version: impl Into<String>, kind: DependencyKind) -> Self {
        Self {
            version: version.into(),
            kind,
        }
    }
}

/// Trait for ecosystem-specific manifest operations.
///
/// Adapters only touch the keys the orchestration layer manages: the engine
/// pin, local path dependencies and native build references. Everything
/// else in the manifest is preserved.
pub trait EcosystemAdapter: Send + Sync {
    /// File name of the manifest inside the project directory.
    fn manifest_file(&self) -> &'static str;

    fn detect(&self, path: &Path) -> bool {
        path.join(self.manifest_file()).exists()
    }

    /// Native commands for the standard lifecycle tasks, as `(task, command)`.
    fn lifecycle_commands(&self) -> &'static [(&'static str, &'static str)];

    /// Reads the version of `tool` declared in an existing manifest, along
    /// with the section it is declared in.
    fn read_pin(&self, path: &Path, tool: &str) -> Result<Option<ManifestPin>>;

    /// Writes the project's managed declarations into its manifest.
    fn write_manifest(&self, project: &Project, path: &Path) -> Result<()>;
}

/// Native synthesis step that writes a project's manifest through an adapter.
pub struct ManifestHook {
    adapter: Box<dyn EcosystemAdapter>,
}

impl ManifestHook {
    pub fn new(adapter: Box<dyn EcosystemAdapter>) -> Self {
        Self { adapter }
    }
}

impl SynthHook for ManifestHook {
    fn name(&self) -> &str {
        self.adapter.manifest_file()
    }

    fn synthesize(&mut self, project: &Project, ctx: &HookContext) -> Result<()> {
        std::fs::create_dir_all(&ctx.project_dir)?;
        self.adapter.write_manifest(project, &ctx.project_dir)
    }
}
