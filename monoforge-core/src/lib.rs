//! Core library for polyglot monorepo orchestration.

pub mod adapter;
pub mod config;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod overrides;
pub mod process;
pub mod project;
pub mod registrar;
pub mod run_many;
pub mod runner_config;
pub mod runtime;
pub mod task;
pub mod version_sync;
pub mod workspace;

pub use adapter::{EcosystemAdapter, ManifestHook, ManifestPin};
pub use config::{MonorepoConfig, ProjectDefinition, WorkspaceSettings};
pub use error::{Error, Result};
pub use graph::{DependencyEdge, EdgeKind, WorkspaceGraph};
pub use lifecycle::{HookContext, LifecycleSequencer, Phase, SynthHook, SynthState};
pub use overrides::{OverrideOptions, OverrideScope};
pub use project::{
    BuildReference, Dependency, DependencyKind, DependencySpec, Ecosystem, Language, Project,
    ProjectId,
};
pub use registrar::DependencyRef;
pub use run_many::{RunManyComposer, RunManyOptions};
pub use runtime::TaskRuntime;
pub use task::{Task, TaskCapture, TaskStep};
pub use version_sync::SyncedPin;
pub use workspace::{Monorepo, Orchestrator, INSTALL_TASK};
