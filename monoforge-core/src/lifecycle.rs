//! Synthesis lifecycle: phases, per-project hooks and the sequencer that
//! orders them.
//!
//! Every phase finishes for the whole workspace before the next one starts.
//! The orchestration layer runs before the project hooks in pre-synthesis
//! and synthesis, and after them in post-synthesis.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::graph::WorkspaceGraph;
use crate::project::{Project, ProjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    PreSynthesize,
    Synthesize,
    PostSynthesize,
}

/// Phases in execution order.
pub const PHASES: [Phase; 3] = [Phase::PreSynthesize, Phase::Synthesize, Phase::PostSynthesize];

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::PreSynthesize => "pre-synthesize",
            Phase::Synthesize => "synthesize",
            Phase::PostSynthesize => "post-synthesize",
        }
    }

    /// Whether the orchestration layer runs before the project hooks.
    #[inline]
    pub fn outer_first(&self) -> bool {
        !matches!(self, Phase::PostSynthesize)
    }

    fn requires(&self) -> SynthState {
        match self {
            Phase::PreSynthesize => SynthState::Constructing,
            Phase::Synthesize => SynthState::PreSynthesized,
            Phase::PostSynthesize => SynthState::Synthesized,
        }
    }

    fn completes(&self) -> SynthState {
        match self {
            Phase::PreSynthesize => SynthState::PreSynthesized,
            Phase::Synthesize => SynthState::Synthesized,
            Phase::PostSynthesize => SynthState::PostSynthesized,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a workspace is in its generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SynthState {
    Constructing,
    PreSynthesized,
    Synthesized,
    PostSynthesized,
}

impl Default for SynthState {
    fn default() -> Self {
        SynthState::Constructing
    }
}

impl fmt::Display for SynthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SynthState::Constructing => "constructing",
            SynthState::PreSynthesized => "pre-synthesized",
            SynthState::Synthesized => "synthesized",
            SynthState::PostSynthesized => "post-synthesized",
        };
        f.write_str(s)
    }
}

/// Paths available to a hook.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub workspace_root: PathBuf,
    /// Absolute output directory of the project the hook belongs to.
    pub project_dir: PathBuf,
}

/// Per-project behavior attached to the synthesis phases.
///
/// All methods default to doing nothing.
pub trait SynthHook {
    fn name(&self) -> &str;

    fn pre_synthesize(&mut self, _project: &mut Project, _ctx: &HookContext) -> Result<()> {
        Ok(())
    }

    fn synthesize(&mut self, _project: &Project, _ctx: &HookContext) -> Result<()> {
        Ok(())
    }

    fn post_synthesize(&mut self, _project: &Project, _ctx: &HookContext) -> Result<()> {
        Ok(())
    }
}

/// Hooks keyed by the project they belong to.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<(ProjectId, Box<dyn SynthHook>)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, project: ProjectId, hook: Box<dyn SynthHook>) {
        self.hooks.push((project, hook));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs `phase` for every project in registration order, root first.
    pub fn run(
        &mut self,
        phase: Phase,
        graph: &mut WorkspaceGraph,
        workspace_root: &Path,
    ) -> Result<()> {
        let ids: Vec<ProjectId> = graph.projects().map(|(id, _)| id).collect();
        for id in ids {
            for (_, hook) in self.hooks.iter_mut().filter(|(owner, _)| *owner == id) {
                let project = graph.get_mut(id)?;
                let ctx = HookContext {
                    workspace_root: workspace_root.to_path_buf(),
                    project_dir: workspace_root.join(&project.outdir),
                };
                debug!(project = %project.name, hook = hook.name(), %phase, "running hook");
                match phase {
                    Phase::PreSynthesize => hook.pre_synthesize(project, &ctx)?,
                    Phase::Synthesize => hook.synthesize(project, &ctx)?,
                    Phase::PostSynthesize => hook.post_synthesize(project, &ctx)?,
                }
            }
        }
        Ok(())
    }
}

/// The two halves of one phase: the orchestration layer and the project hooks.
pub trait PhaseHandler {
    fn run_outer(&mut self, phase: Phase) -> Result<()>;
    fn run_inner(&mut self, phase: Phase) -> Result<()>;
}

/// State machine that runs each phase once, in order.
#[derive(Debug, Default)]
pub struct LifecycleSequencer {
    state: SynthState,
}

impl LifecycleSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> SynthState {
        self.state
    }

    /// Runs `phase` through `handler`.
    ///
    /// Returns `false` without running anything when the phase already ran.
    ///
    /// # Errors
    ///
    /// Returns an error if an earlier phase has not run yet, or if the
    /// handler fails. A failed phase can not be resumed.
    pub fn run_phase<H: PhaseHandler>(&mut self, phase: Phase, handler: &mut H) -> Result<bool> {
        let current = self.state();
        if current >= phase.completes() {
            debug!(%phase, "phase already ran");
            return Ok(false);
        }
        if current != phase.requires() {
            return Err(Error::PhaseOrder {
                requested: phase.to_string(),
                current: current.to_string(),
            });
        }

        info!(%phase, "starting phase");
        if phase.outer_first() {
            handler.run_outer(phase)?;
            handler.run_inner(phase)?;
        } else {
            handler.run_inner(phase)?;
            handler.run_outer(phase)?;
        }
        self.state = phase.completes();
        Ok(true)
    }

    /// Runs every phase that has not run yet.
    pub fn run_all<H: PhaseHandler>(&mut self, handler: &mut H) -> Result<()> {
        for phase in PHASES {
            self.run_phase(phase, handler)?;
        }
        Ok(())
    }
}
