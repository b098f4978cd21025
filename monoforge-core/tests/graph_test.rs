use monoforge_core::error::Error;
use monoforge_core::graph::{EdgeKind, WorkspaceGraph};
use monoforge_core::project::{Language, Project, ProjectId};

fn create_test_graph() -> (WorkspaceGraph, ProjectId, ProjectId, ProjectId) {
    let mut graph = WorkspaceGraph::new(Project::new("monorepo", Language::TypeScript, "."));
    let types = graph
        .register_project(Project::new("types", Language::TypeScript, "packages/types"))
        .unwrap();
    let client = graph
        .register_project(Project::new("client", Language::Python, "packages/client"))
        .unwrap();
    let app = graph
        .register_project(Project::new("app", Language::Java, "packages/app"))
        .unwrap();
    (graph, types, client, app)
}

#[test]
fn test_root_is_registered() {
    let graph = WorkspaceGraph::new(Project::new("monorepo", Language::TypeScript, "."));
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.root().name, "monorepo");
    assert_eq!(graph.resolve("monorepo").unwrap(), ProjectId::ROOT);
    assert_eq!(graph.subprojects().count(), 0);
}

#[test]
fn test_register_same_project_twice() {
    let (mut graph, types, _, _) = create_test_graph();
    let again = graph
        .register_project(Project::new("types", Language::TypeScript, "packages/types"))
        .unwrap();
    assert_eq!(again, types);
    assert_eq!(graph.len(), 4);
}

#[test]
fn test_register_conflicting_project_with_same_name() {
    let (mut graph, types, _, _) = create_test_graph();

    let err = graph
        .register_project(Project::new("types", Language::TypeScript, "elsewhere"))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateProject { ref name, .. } if name == "types"));

    let err = graph
        .register_project(Project::new("types", Language::Java, "packages/types"))
        .unwrap_err();
    assert!(err.to_string().contains("java project at packages/types"));

    assert_eq!(graph.len(), 4);
    assert_eq!(graph.get(types).unwrap().language, Language::TypeScript);
}

#[test]
fn test_topological_order() {
    let (mut graph, types, client, app) = create_test_graph();
    graph.add_edge(app, client, EdgeKind::Implicit).unwrap();
    graph.add_edge(client, types, EdgeKind::Implicit).unwrap();

    let order = graph.topological_order().unwrap();
    let pos = |id| order.iter().position(|o| *o == id).unwrap();
    assert_eq!(order.len(), 4);
    assert!(pos(types) < pos(client));
    assert!(pos(client) < pos(app));
}

#[test]
fn test_edges_keep_insertion_order() {
    let (mut graph, types, client, app) = create_test_graph();
    graph.add_edge(app, types, EdgeKind::Implicit).unwrap();
    graph.add_edge(client, types, EdgeKind::Implicit).unwrap();
    graph.add_edge(app, client, EdgeKind::Implicit).unwrap();

    let pairs: Vec<_> = graph
        .edges()
        .iter()
        .map(|e| (e.dependent, e.dependee))
        .collect();
    assert_eq!(pairs, vec![(app, types), (client, types), (app, client)]);
    assert_eq!(graph.dependencies_of(app), vec![types, client]);
    assert_eq!(graph.dependents_of(types), vec![app, client]);
}

#[test]
fn test_duplicate_edge_is_noop() {
    let (mut graph, types, client, _) = create_test_graph();
    assert!(graph.add_edge(client, types, EdgeKind::Implicit).unwrap());
    assert!(!graph.add_edge(client, types, EdgeKind::Implicit).unwrap());
    assert_eq!(graph.edges().len(), 1);

    // A different kind between the same pair is a separate edge.
    assert!(graph
        .add_edge(client, types, EdgeKind::CrossEcosystemPackage)
        .unwrap());
    assert_eq!(graph.dependencies_of(client), vec![types]);
}

#[test]
fn test_self_edge_rejected() {
    let (mut graph, types, _, _) = create_test_graph();
    let result = graph.add_edge(types, types, EdgeKind::Implicit);
    assert!(matches!(result, Err(Error::SelfDependency(ref name)) if name == "types"));
}

#[test]
fn test_frozen_graph_rejects_mutation() {
    let (mut graph, types, client, _) = create_test_graph();
    graph.freeze();
    assert!(graph.is_frozen());

    let result = graph.add_edge(client, types, EdgeKind::Implicit);
    assert!(matches!(result, Err(Error::GraphFrozen { .. })));

    let result = graph.register_project(Project::new("late", Language::Python, "late"));
    assert!(matches!(result, Err(Error::GraphFrozen { .. })));
    assert!(graph.edges().is_empty());
}

#[test]
fn test_circular_dependency() {
    let (mut graph, types, client, _) = create_test_graph();
    graph.add_edge(client, types, EdgeKind::Implicit).unwrap();
    graph.add_edge(types, client, EdgeKind::Implicit).unwrap();

    let result = graph.topological_order();
    assert!(matches!(result, Err(Error::CircularDependency(_))));
}

#[test]
fn test_resolve_unknown_project() {
    let (graph, _, _, _) = create_test_graph();
    let err = graph.resolve("missing").unwrap_err();
    assert!(matches!(err, Error::UnknownProject { ref name, .. } if name == "missing"));
    assert!(err.to_string().contains("types"));
}
