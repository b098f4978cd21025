//! Registration of cross-project dependencies that manifests cannot express.
//!
//! The generic implicit edge is canonical. The ecosystem-specific variants add
//! it too, then record a native side effect on the dependent project. A side
//! effect that disagrees with an existing declaration is reported and the
//! existing declaration is kept.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::graph::{EdgeKind, WorkspaceGraph};
use crate::project::{relative_path, BuildReference, Dependency, DependencyKind, DependencySpec, ProjectId};

/// A dependee given either by name or by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyRef<'a> {
    Name(&'a str),
    Id(ProjectId),
}

impl<'a> From<&'a str> for DependencyRef<'a> {
    fn from(name: &'a str) -> Self {
        DependencyRef::Name(name)
    }
}

impl<'a> From<&'a String> for DependencyRef<'a> {
    fn from(name: &'a String) -> Self {
        DependencyRef::Name(name.as_str())
    }
}

impl From<ProjectId> for DependencyRef<'_> {
    fn from(id: ProjectId) -> Self {
        DependencyRef::Id(id)
    }
}

fn resolve(graph: &WorkspaceGraph, dependee: DependencyRef<'_>) -> Result<ProjectId> {
    match dependee {
        DependencyRef::Name(name) => graph.resolve(name),
        DependencyRef::Id(id) => graph.get(id).map(|_| id),
    }
}

/// Adds a generic `dependent -> dependee` edge.
///
/// Returns `false` if the edge was already declared.
///
/// # Errors
///
/// Returns an error if the dependee cannot be resolved, the edge is a
/// self-edge, or the graph is frozen.
pub fn add_implicit_dependency<'a>(
    graph: &mut WorkspaceGraph,
    dependent: ProjectId,
    dependee: impl Into<DependencyRef<'a>>,
) -> Result<bool> {
    let dependee = resolve(graph, dependee.into())?;
    graph.add_edge(dependent, dependee, EdgeKind::Implicit)
}

/// Declares a dependency between two projects of the same ecosystem.
///
/// Besides the graph edges, the dependent's native build descriptor gets a
/// direct reference to the dependee so the native toolchain resolves it
/// without the batch runner.
///
/// # Errors
///
/// Returns an error if the projects are in different ecosystems, or for
/// any reason [`add_implicit_dependency`] fails.
pub fn add_same_ecosystem_dependency(
    graph: &mut WorkspaceGraph,
    dependent: ProjectId,
    dependee: ProjectId,
) -> Result<()> {
    let (dependent_project, dependee_project) = (graph.get(dependent)?, graph.get(dependee)?);
    if dependent_project.language.ecosystem() != dependee_project.language.ecosystem() {
        return Err(Error::EcosystemMismatch {
            dependent: dependent_project.name.clone(),
            dependent_language: dependent_project.language.as_str().to_string(),
            dependee: dependee_project.name.clone(),
            dependee_language: dependee_project.language.as_str().to_string(),
        });
    }

    let reference = BuildReference {
        project: dependee_project.name.clone(),
        group: dependee_project.group.clone(),
        version: dependee_project.version.clone(),
        relative_path: relative_path(&dependent_project.outdir, &dependee_project.outdir),
    };

    add_implicit_dependency(graph, dependent, dependee)?;
    graph.add_edge(dependent, dependee, EdgeKind::SameEcosystemBuild)?;

    let project = graph.get_mut(dependent)?;
    let existing = project
        .build_references()
        .iter()
        .find(|r| r.project == reference.project)
        .cloned();
    match existing {
        Some(existing) if existing != reference => warn!(
            dependent = %project.name,
            dependee = %reference.project,
            "native build reference already declared with different coordinates; keeping it"
        ),
        Some(_) => {}
        None => {
            debug!(dependent = %project.name, dependee = %reference.project, "added build reference");
            project.add_build_reference(reference);
        }
    }
    Ok(())
}

/// Declares a package-level dependency across ecosystems.
///
/// The dependent's manifest gets a path reference to the dependee's output
/// directory, since registries cannot resolve unpublished workspace packages.
///
/// # Errors
///
/// Returns an error for any reason [`add_implicit_dependency`] fails.
pub fn add_cross_ecosystem_package_dependency(
    graph: &mut WorkspaceGraph,
    dependent: ProjectId,
    dependee: ProjectId,
) -> Result<()> {
    let (dependent_project, dependee_project) = (graph.get(dependent)?, graph.get(dependee)?);
    let dependency = Dependency {
        name: dependee_project.name.clone(),
        spec: DependencySpec::Path(relative_path(
            &dependent_project.outdir,
            &dependee_project.outdir,
        )),
        kind: DependencyKind::Runtime,
    };

    add_implicit_dependency(graph, dependent, dependee)?;
    graph.add_edge(dependent, dependee, EdgeKind::CrossEcosystemPackage)?;

    let project = graph.get_mut(dependent)?;
    match project.dependency(&dependency.name) {
        Some(existing) if *existing != dependency => warn!(
            dependent = %project.name,
            dependee = %dependency.name,
            "manifest already declares the dependee differently; keeping the existing declaration"
        ),
        Some(_) => {}
        None => {
            debug!(dependent = %project.name, dependee = %dependency.name, "added path dependency");
            project.add_dependency(dependency);
        }
    }
    Ok(())
}
