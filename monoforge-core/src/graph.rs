//! Workspace dependency graph using petgraph.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::project::{Project, ProjectId};

/// Why one project depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Generic relationship not derivable from manifests.
    Implicit,
    /// Both projects share a native toolchain that must also know the edge.
    SameEcosystemBuild,
    /// The dependent resolves the dependee through a local package reference.
    CrossEcosystemPackage,
}

/// Directed relation `dependent -> dependee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub dependent: ProjectId,
    pub dependee: ProjectId,
    pub kind: EdgeKind,
}

/// Arena of all workspace projects plus the edges between them.
///
/// The root project is registered on construction and always has
/// [`ProjectId::ROOT`]. Edges are additive and kept in insertion order so
/// generated configuration is reproducible.
#[derive(Debug)]
pub struct WorkspaceGraph {
    projects: Vec<Project>,
    node_map: HashMap<String, ProjectId>,
    graph: DiGraph<ProjectId, EdgeKind>,
    edges: Vec<DependencyEdge>,
    frozen: bool,
}

impl WorkspaceGraph {
    pub fn new(root: Project) -> Self {
        let mut graph = Self {
            projects: Vec::new(),
            node_map: HashMap::new(),
            graph: DiGraph::new(),
            edges: Vec::new(),
            frozen: false,
        };
        graph.insert(root);
        graph
    }

    fn insert(&mut self, project: Project) -> ProjectId {
        let id = ProjectId(self.projects.len());
        let node = self.graph.add_node(id);
        debug_assert_eq!(node.index(), id.0);
        self.node_map.insert(project.name.clone(), id);
        self.projects.push(project);
        id
    }

    fn available(&self) -> String {
        self.projects
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Registers a project, or returns the id of the already registered
    /// project with the same name, language and output directory.
    ///
    /// # Errors
    ///
    /// Returns an error once the graph is frozen, or if the name is taken by
    /// a project with a different language or output directory.
    pub fn register_project(&mut self, project: Project) -> Result<ProjectId> {
        if let Some(&id) = self.node_map.get(&project.name) {
            let existing = &self.projects[id.0];
            if existing.language != project.language || existing.outdir != project.outdir {
                return Err(Error::DuplicateProject {
                    name: project.name.clone(),
                    existing: existing.location(),
                    requested: project.location(),
                });
            }
            debug!(project = %project.name, "project already registered");
            return Ok(id);
        }
        if self.frozen {
            return Err(Error::GraphFrozen {
                operation: format!("register project {}", project.name),
            });
        }
        debug!(project = %project.name, "registering project");
        Ok(self.insert(project))
    }

    /// Adds an edge; returns `false` when the identical edge already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is unknown, the edge is a
    /// self-edge, or the graph is frozen.
    pub fn add_edge(
        &mut self,
        dependent: ProjectId,
        dependee: ProjectId,
        kind: EdgeKind,
    ) -> Result<bool> {
        let dependent_name = self.get(dependent)?.name.clone();
        let dependee_name = self.get(dependee)?.name.clone();

        if self.frozen {
            return Err(Error::GraphFrozen {
                operation: format!("add dependency {} -> {}", dependent_name, dependee_name),
            });
        }
        if dependent == dependee {
            return Err(Error::SelfDependency(dependent_name));
        }

        let edge = DependencyEdge {
            dependent,
            dependee,
            kind,
        };
        if self.edges.contains(&edge) {
            return Ok(false);
        }

        self.graph.add_edge(
            NodeIndex::new(dependent.0),
            NodeIndex::new(dependee.0),
            kind,
        );
        self.edges.push(edge);
        debug!(dependent = %dependent_name, dependee = %dependee_name, ?kind, "added edge");
        Ok(true)
    }

    /// Prevents any further mutation of the project set and edges.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Resolves a project name to its id.
    ///
    /// # Errors
    ///
    /// Returns an error if no project with that name is registered.
    pub fn resolve(&self, name: &str) -> Result<ProjectId> {
        self.node_map
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownProject {
                name: name.to_string(),
                available: self.available(),
            })
    }

    #[inline]
    pub fn find(&self, name: &str) -> Option<ProjectId> {
        self.node_map.get(name).copied()
    }

    /// Returns the project for an id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not belong to this workspace.
    pub fn get(&self, id: ProjectId) -> Result<&Project> {
        self.projects.get(id.0).ok_or_else(|| Error::UnknownProject {
            name: id.to_string(),
            available: self.available(),
        })
    }

    /// Mutable variant of [`WorkspaceGraph::get`].
    pub fn get_mut(&mut self, id: ProjectId) -> Result<&mut Project> {
        if id.0 >= self.projects.len() {
            return Err(Error::UnknownProject {
                name: id.to_string(),
                available: self.available(),
            });
        }
        Ok(&mut self.projects[id.0])
    }

    #[inline]
    pub fn root(&self) -> &Project {
        &self.projects[ProjectId::ROOT.0]
    }

    /// All projects including the root, in registration order.
    pub fn projects(&self) -> impl Iterator<Item = (ProjectId, &Project)> {
        self.projects
            .iter()
            .enumerate()
            .map(|(idx, p)| (ProjectId(idx), p))
    }

    /// All projects except the root, in registration order.
    pub fn subprojects(&self) -> impl Iterator<Item = (ProjectId, &Project)> {
        self.projects().skip(1)
    }

    pub(crate) fn subprojects_mut(&mut self) -> impl Iterator<Item = &mut Project> {
        self.projects.iter_mut().skip(1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Edges in the order they were added.
    #[inline]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Distinct direct dependees of a project, in edge insertion order.
    pub fn dependencies_of(&self, id: ProjectId) -> Vec<ProjectId> {
        let mut result = Vec::new();
        for edge in self.edges.iter().filter(|e| e.dependent == id) {
            if !result.contains(&edge.dependee) {
                result.push(edge.dependee);
            }
        }
        result
    }

    /// Distinct direct dependents of a project, in edge insertion order.
    pub fn dependents_of(&self, id: ProjectId) -> Vec<ProjectId> {
        let mut result = Vec::new();
        for edge in self.edges.iter().filter(|e| e.dependee == id) {
            if !result.contains(&edge.dependent) {
                result.push(edge.dependent);
            }
        }
        result
    }

    /// Returns `true` if an edge of any kind links `dependent` to `dependee`.
    pub fn depends_on(&self, dependent: ProjectId, dependee: ProjectId) -> bool {
        self.edges
            .iter()
            .any(|e| e.dependent == dependent && e.dependee == dependee)
    }

    /// Returns projects with dependees before dependents.
    ///
    /// # Errors
    ///
    /// Returns an error if the edges form a cycle.
    pub fn topological_order(&self) -> Result<Vec<ProjectId>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let id = self.graph[cycle.node_id()];
            let name = self
                .projects
                .get(id.0)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| id.to_string());
            Error::CircularDependency(format!("Cycle detected involving: {}", name))
        })?;

        Ok(sorted.into_iter().rev().map(|idx| self.graph[idx]).collect())
    }
}
