//! The monorepo root: orchestration capability plus the lifecycle around it.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::adapter::{EcosystemAdapter, ManifestHook};
use crate::config::{MonorepoConfig, WorkspaceSettings};
use crate::error::{Error, Result};
use crate::graph::WorkspaceGraph;
use crate::lifecycle::{
    HookRegistry, LifecycleSequencer, Phase, PhaseHandler, SynthHook, SynthState,
};
use crate::overrides::{self, OverrideOptions, OverrideScope};
use crate::project::{DependencyKind, Language, Project, ProjectId};
use crate::registrar::{self, DependencyRef};
use crate::run_many::{RunManyComposer, RunManyOptions};
use crate::runner_config::{
    install_command, write_json, write_runner_manifest, ProjectConfig, RunnerConfig,
    TasksManifest, PROJECT_CONFIG_FILE, RUNNER_CONFIG_FILE, RUNNER_MANIFEST_FILE, TASKS_FILE,
};
use crate::runtime::TaskRuntime;
use crate::task::Task;
use crate::version_sync::{sync_versions, validate_version, SyncedPin};

/// Root task that installs the batch runner in the workspace root.
pub const INSTALL_TASK: &str = "install:runner";

/// Graph-orchestration capability owned by the workspace root.
///
/// Holds the workspace graph and the run-many composer, and implements the
/// orchestration half of every lifecycle phase.
pub struct Orchestrator {
    settings: WorkspaceSettings,
    root_dir: PathBuf,
    graph: WorkspaceGraph,
    composer: RunManyComposer,
}

impl Orchestrator {
    /// Creates the workspace with its root project registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine version or root language is invalid.
    pub fn new(settings: WorkspaceSettings, root_dir: impl Into<PathBuf>) -> Result<Self> {
        validate_version(&settings.engine, &settings.engine_version)?;
        let language = settings.parse_language()?;
        let root_dir = root_dir.into();

        let mut root = Project::new(&settings.name, language, ".");
        root.add_version_dependency(&settings.engine, &settings.engine_version, DependencyKind::Dev);
        let mut install =
            Task::new(INSTALL_TASK).with_description("Install the batch runner and its plugins");
        install.exec(install_command(&settings.package_manager));
        root.add_task(install)?;

        let composer = RunManyComposer::new(
            root_dir.clone(),
            settings.runner.clone(),
            settings.default_parallel,
        );

        Ok(Self {
            settings,
            root_dir,
            graph: WorkspaceGraph::new(root),
            composer,
        })
    }

    #[inline]
    pub fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    #[inline]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    #[inline]
    pub fn graph(&self) -> &WorkspaceGraph {
        &self.graph
    }

    #[inline]
    pub fn graph_mut(&mut self) -> &mut WorkspaceGraph {
        &mut self.graph
    }

    #[inline]
    pub fn composer(&self) -> &RunManyComposer {
        &self.composer
    }

    pub fn compose_run_many_command(&self, options: &RunManyOptions) -> Vec<String> {
        self.composer.compose_run_many_command(options)
    }

    pub fn exec_run_many_command(&self, options: &RunManyOptions) -> Result<String> {
        self.composer.exec_run_many_command(options)
    }

    /// Adds a workspace-level task running `options` across the graph.
    pub fn add_run_many_task(&mut self, name: &str, options: &RunManyOptions) -> Result<&Task> {
        let root = self.graph.get_mut(ProjectId::ROOT)?;
        self.composer.add_run_many_task(root, name, options)
    }

    /// Captures a task so it delegates to the batch runner.
    ///
    /// Tasks of the root run their target for every project; tasks of a
    /// subproject run it for that project only.
    pub fn override_task(
        &mut self,
        project: ProjectId,
        task: &str,
        target: &str,
        options: OverrideOptions,
    ) -> Result<bool> {
        let scope = scope_of(project);
        let project = self.graph.get_mut(project)?;
        overrides::override_task(&self.composer, project, scope, task, target, options)
    }

    /// Captures every standard lifecycle task of a project.
    pub fn capture_lifecycle(&mut self, project: ProjectId, force_build: bool) -> Result<usize> {
        let scope = scope_of(project);
        let project = self.graph.get_mut(project)?;
        overrides::capture_lifecycle(&self.composer, project, scope, force_build)
    }

    pub fn add_implicit_dependency<'a>(
        &mut self,
        dependent: ProjectId,
        dependee: impl Into<DependencyRef<'a>>,
    ) -> Result<bool> {
        registrar::add_implicit_dependency(&mut self.graph, dependent, dependee)
    }

    pub fn add_same_ecosystem_dependency(
        &mut self,
        dependent: ProjectId,
        dependee: ProjectId,
    ) -> Result<()> {
        registrar::add_same_ecosystem_dependency(&mut self.graph, dependent, dependee)
    }

    pub fn add_cross_ecosystem_package_dependency(
        &mut self,
        dependent: ProjectId,
        dependee: ProjectId,
    ) -> Result<()> {
        registrar::add_cross_ecosystem_package_dependency(&mut self.graph, dependent, dependee)
    }

    /// Freezes the graph and pins the engine version in every subproject.
    pub fn pre_synthesize(&mut self) -> Result<Vec<SyncedPin>> {
        self.graph.freeze();
        let synced = sync_versions(
            self.graph.subprojects_mut(),
            &self.settings.engine,
            &self.settings.engine_version,
        )?;
        for pin in &synced {
            info!(
                project = %pin.project,
                "pinned {} {} (was {})",
                self.settings.engine,
                pin.version,
                pin.previous
            );
        }
        Ok(synced)
    }

    /// Writes the runner configuration and task definitions.
    pub fn synthesize(&self) -> Result<()> {
        let config = RunnerConfig::from_graph(
            &self.graph,
            &self.settings.default_branch,
            &self.settings.plugins,
        );
        write_json(&self.root_dir.join(RUNNER_CONFIG_FILE), &config)?;
        write_runner_manifest(
            &self.root_dir.join(RUNNER_MANIFEST_FILE),
            &self.settings.name,
            &self.settings.runner_packages(),
        )?;

        for (id, project) in self.graph.projects() {
            let dir = self.root_dir.join(&project.outdir);
            if id != ProjectId::ROOT {
                let project_config = ProjectConfig::from_project(&self.graph, id)?;
                write_json(&dir.join(PROJECT_CONFIG_FILE), &project_config)?;
            }
            write_json(&dir.join(TASKS_FILE), &TasksManifest::from(project))?;
        }
        info!(projects = self.graph.len(), "wrote runner configuration");
        Ok(())
    }

    /// Installs the batch runner; the workspace is unusable until this succeeds.
    pub fn post_synthesize(&self) -> Result<()> {
        info!("Installing dependencies...");
        let runtime = TaskRuntime::new(&self.root_dir);
        runtime
            .run_task(self.graph.root(), INSTALL_TASK, &[])
            .map_err(|e| Error::InstallFailure {
                task: INSTALL_TASK.to_string(),
                message: e.to_string(),
            })
    }
}

fn scope_of(project: ProjectId) -> OverrideScope {
    if project == ProjectId::ROOT {
        OverrideScope::Workspace
    } else {
        OverrideScope::Project
    }
}

struct Phases<'a> {
    orchestrator: &'a mut Orchestrator,
    hooks: &'a mut HookRegistry,
    synced: &'a mut Vec<SyncedPin>,
}

impl PhaseHandler for Phases<'_> {
    fn run_outer(&mut self, phase: Phase) -> Result<()> {
        match phase {
            Phase::PreSynthesize => {
                let synced = self.orchestrator.pre_synthesize()?;
                self.synced.extend(synced);
                Ok(())
            }
            Phase::Synthesize => self.orchestrator.synthesize(),
            Phase::PostSynthesize => self.orchestrator.post_synthesize(),
        }
    }

    fn run_inner(&mut self, phase: Phase) -> Result<()> {
        let root_dir = self.orchestrator.root_dir.clone();
        self.hooks.run(phase, &mut self.orchestrator.graph, &root_dir)
    }
}

/// Root project of a generated polyglot monorepo.
///
/// Composes the [`Orchestrator`] capability and forwards its operations;
/// subprojects attach through [`Monorepo::add_project`].
pub struct Monorepo {
    orchestrator: Orchestrator,
    hooks: HookRegistry,
    sequencer: LifecycleSequencer,
    synced: Vec<SyncedPin>,
}

impl Monorepo {
    /// Creates the monorepo and captures the root lifecycle tasks.
    ///
    /// The root `build` is captured with `force` so a workspace build
    /// always re-runs every project.
    pub fn new(settings: WorkspaceSettings, root_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut orchestrator = Orchestrator::new(settings, root_dir)?;
        orchestrator.capture_lifecycle(ProjectId::ROOT, true)?;
        Ok(Self {
            orchestrator,
            hooks: HookRegistry::new(),
            sequencer: LifecycleSequencer::new(),
            synced: Vec::new(),
        })
    }

    /// Builds a monorepo from its configuration.
    ///
    /// `adapter_for` supplies the manifest adapter of each project language;
    /// adapters contribute lifecycle commands, the existing engine pin and
    /// the manifest synthesis hook.
    pub fn from_config<F>(config: &MonorepoConfig, adapter_for: F) -> Result<Self>
    where
        F: Fn(&Language) -> Box<dyn EcosystemAdapter>,
    {
        let mut monorepo = Self::new(config.workspace.clone(), config.root_dir.clone())?;
        let engine = config.workspace.engine.clone();
        let mut ids = Vec::with_capacity(config.projects.len());

        for definition in &config.projects {
            if let Some(existing) = monorepo.graph().find(&definition.name) {
                return Err(Error::DuplicateProject {
                    name: definition.name.clone(),
                    existing: monorepo.graph().get(existing)?.location(),
                    requested: format!(
                        "{} project at {}",
                        definition.language,
                        definition.outdir.display()
                    ),
                });
            }
            let language = definition.parse_language()?;
            let adapter = adapter_for(&language);

            let mut project = Project::new(&definition.name, language, &definition.outdir);
            if let Some(ref version) = definition.version {
                project = project.with_version(version);
            }
            if let Some(ref group) = definition.group {
                project = project.with_group(group);
            }
            project.tags = definition.tags.clone();

            for (task_name, command) in adapter.lifecycle_commands() {
                if let Some(task) = project.task_mut(task_name) {
                    task.exec(*command);
                }
            }
            for (task_name, command) in &definition.tasks {
                match project.task_mut(task_name) {
                    Some(task) => {
                        task.exec(command);
                    }
                    None => {
                        let mut task = Task::new(task_name);
                        task.exec(command);
                        project.add_task(task)?;
                    }
                }
            }

            if definition.managed {
                let project_dir = config.root_dir.join(&definition.outdir);
                let existing = if adapter.detect(&project_dir) {
                    adapter.read_pin(&project_dir, &engine)?
                } else {
                    None
                };
                let (pin, kind) = match existing {
                    Some(pin) => (pin.version, pin.kind),
                    None => (config.workspace.engine_version.clone(), DependencyKind::Dev),
                };
                project.add_version_dependency(&engine, pin, kind);
            }

            let id = monorepo.add_project(project)?;
            monorepo.add_hook(id, Box::new(ManifestHook::new(adapter)));
            ids.push(id);
        }

        for (definition, id) in config.projects.iter().zip(ids) {
            for dependee in &definition.implicit {
                monorepo.add_implicit_dependency(id, dependee)?;
            }
            for dependee in &definition.same_ecosystem {
                let dependee = monorepo.graph().resolve(dependee)?;
                monorepo.add_same_ecosystem_dependency(id, dependee)?;
            }
            for dependee in &definition.package {
                let dependee = monorepo.graph().resolve(dependee)?;
                monorepo.add_cross_ecosystem_package_dependency(id, dependee)?;
            }
        }

        Ok(monorepo)
    }

    #[inline]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    #[inline]
    pub fn graph(&self) -> &WorkspaceGraph {
        self.orchestrator.graph()
    }

    #[inline]
    pub fn root_dir(&self) -> &Path {
        self.orchestrator.root_dir()
    }

    #[inline]
    pub fn state(&self) -> SynthState {
        self.sequencer.state()
    }

    /// Pins rewritten during pre-synthesis.
    pub fn synced_pins(&self) -> &[SyncedPin] {
        &self.synced
    }

    pub fn project(&self, id: ProjectId) -> Result<&Project> {
        self.graph().get(id)
    }

    /// Attaches a subproject to the workspace.
    pub fn add_project(&mut self, project: Project) -> Result<ProjectId> {
        self.orchestrator.graph_mut().register_project(project)
    }

    pub fn add_hook(&mut self, project: ProjectId, hook: Box<dyn SynthHook>) {
        self.hooks.register(project, hook);
    }

    pub fn compose_run_many_command(&self, options: &RunManyOptions) -> Vec<String> {
        self.orchestrator.compose_run_many_command(options)
    }

    pub fn exec_run_many_command(&self, options: &RunManyOptions) -> Result<String> {
        self.orchestrator.exec_run_many_command(options)
    }

    pub fn add_run_many_task(&mut self, name: &str, options: &RunManyOptions) -> Result<&Task> {
        self.orchestrator.add_run_many_task(name, options)
    }

    pub fn override_task(
        &mut self,
        project: ProjectId,
        task: &str,
        target: &str,
        options: OverrideOptions,
    ) -> Result<bool> {
        self.orchestrator.override_task(project, task, target, options)
    }

    pub fn add_implicit_dependency<'a>(
        &mut self,
        dependent: ProjectId,
        dependee: impl Into<DependencyRef<'a>>,
    ) -> Result<bool> {
        self.orchestrator.add_implicit_dependency(dependent, dependee)
    }

    pub fn add_same_ecosystem_dependency(
        &mut self,
        dependent: ProjectId,
        dependee: ProjectId,
    ) -> Result<()> {
        self.orchestrator.add_same_ecosystem_dependency(dependent, dependee)
    }

    pub fn add_cross_ecosystem_package_dependency(
        &mut self,
        dependent: ProjectId,
        dependee: ProjectId,
    ) -> Result<()> {
        self.orchestrator
            .add_cross_ecosystem_package_dependency(dependent, dependee)
    }

    fn run_phase(&mut self, phase: Phase) -> Result<bool> {
        let mut phases = Phases {
            orchestrator: &mut self.orchestrator,
            hooks: &mut self.hooks,
            synced: &mut self.synced,
        };
        self.sequencer.run_phase(phase, &mut phases)
    }

    pub fn pre_synthesize(&mut self) -> Result<bool> {
        self.run_phase(Phase::PreSynthesize)
    }

    pub fn synthesize(&mut self) -> Result<bool> {
        self.run_phase(Phase::Synthesize)
    }

    pub fn post_synthesize(&mut self) -> Result<bool> {
        self.run_phase(Phase::PostSynthesize)
    }

    /// Runs every remaining lifecycle phase in order.
    pub fn synth(&mut self) -> Result<()> {
        let mut phases = Phases {
            orchestrator: &mut self.orchestrator,
            hooks: &mut self.hooks,
            synced: &mut self.synced,
        };
        self.sequencer.run_all(&mut phases)
    }
}
