use monoforge_core::error::Error;
use monoforge_core::project::{DependencyKind, Language, Project};
use monoforge_core::version_sync::{sync_versions, validate_version};

fn projects() -> Vec<Project> {
    let mut a = Project::new("a", Language::TypeScript, "a");
    a.add_version_dependency("projen", "0.71.0", DependencyKind::Dev);
    let mut b = Project::new("b", Language::Python, "b");
    b.add_version_dependency("projen", "5.2.0", DependencyKind::Dev);
    let c = Project::new("c", Language::Java, "c");
    let mut d = Project::new("d", Language::Java, "d");
    d.add_version_dependency("projen", "^0.60", DependencyKind::Runtime);
    vec![a, b, c, d]
}

#[test]
fn test_sync_pins_every_declaring_project() {
    let mut projects = projects();
    let synced = sync_versions(projects.iter_mut(), "projen", "5.2.0").unwrap();

    let changed: Vec<_> = synced.iter().map(|s| s.project.as_str()).collect();
    assert_eq!(changed, vec!["a", "d"]);
    assert_eq!(synced[0].previous, "0.71.0");

    for project in &projects {
        match project.name.as_str() {
            "c" => assert!(project.dependency("projen").is_none()),
            _ => assert_eq!(project.pinned_version("projen"), Some("5.2.0")),
        }
    }
    assert_eq!(
        projects[3].dependency("projen").unwrap().kind,
        DependencyKind::Runtime
    );
}

#[test]
fn test_sync_is_repeatable() {
    let mut projects = projects();
    sync_versions(projects.iter_mut(), "projen", "5.2.0").unwrap();
    let synced = sync_versions(projects.iter_mut(), "projen", "5.2.0").unwrap();
    assert!(synced.is_empty());
}

#[test]
fn test_sync_rejects_invalid_version() {
    let mut projects = projects();
    let result = sync_versions(projects.iter_mut(), "projen", "not a version");
    assert!(matches!(result, Err(Error::InvalidVersion { .. })));
    assert_eq!(projects[0].pinned_version("projen"), Some("0.71.0"));
}

#[test]
fn test_validate_version() {
    assert!(validate_version("projen", "0.79.3").is_ok());
    assert!(validate_version("projen", "^1.2").is_ok());
    assert!(validate_version("projen", "latest").is_err());
}
