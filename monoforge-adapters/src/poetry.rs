//! Poetry adapter for `pyproject.toml` manifests.
//!
//! Runtime dependencies live in `[tool.poetry.dependencies]`, development
//! ones in `[tool.poetry.group.dev.dependencies]`. Local dependencies are
//! declared as editable path installs so the dependee's sources are used
//! directly.

use std::fs;
use std::path::Path;

use monoforge_core::adapter::{EcosystemAdapter, ManifestPin};
use monoforge_core::error::{Error, Result};
use monoforge_core::project::{DependencyKind, DependencySpec, Project};
use toml::value::Table;
use toml::Value;

const MANIFEST: &str = "pyproject.toml";
const DEFAULT_PYTHON: &str = "^3.8";
const RUNTIME_SECTION: &[&str] = &["dependencies"];
const DEV_SECTION: &[&str] = &["group", "dev", "dependencies"];

/// Adapter for Python projects built with Poetry.
pub struct PoetryAdapter;

fn parse(project: &str, manifest_path: &Path) -> Result<Option<Table>> {
    if !manifest_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(manifest_path)?;
    toml::from_str::<Table>(&content).map(Some).map_err(|e| Error::Adapter {
        project: project.to_string(),
        message: format!(
            "Failed to parse {}: {}. File may be malformed.",
            manifest_path.display(),
            e
        ),
    })
}

/// Walks `keys` from `table`, creating empty tables on the way.
fn table_at<'a>(table: &'a mut Table, keys: &[&str], project: &str) -> Result<&'a mut Table> {
    let mut current = table;
    for key in keys {
        let entry = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        current = entry.as_table_mut().ok_or_else(|| Error::Adapter {
            project: project.to_string(),
            message: format!("[{}] in {} is not a table", key, MANIFEST),
        })?;
    }
    Ok(current)
}

/// Removes `name` from the table at `keys`, if that table exists.
fn remove_at(table: &mut Table, keys: &[&str], name: &str) {
    let mut current = Some(table);
    for key in keys {
        current = current
            .and_then(|t| t.get_mut(*key))
            .and_then(|v| v.as_table_mut());
    }
    if let Some(section) = current {
        section.remove(name);
    }
}

fn path_dependency(path: &Path) -> Value {
    let mut spec = Table::new();
    spec.insert(
        "path".to_string(),
        Value::String(path.to_string_lossy().replace('\\', "/")),
    );
    spec.insert("develop".to_string(), Value::Boolean(true));
    Value::Table(spec)
}

fn version_of(value: &Value) -> Option<String> {
    match value {
        Value::String(version) => Some(version.clone()),
        Value::Table(spec) => spec
            .get("version")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        _ => None,
    }
}

impl EcosystemAdapter for PoetryAdapter {
    fn manifest_file(&self) -> &'static str {
        MANIFEST
    }

    fn lifecycle_commands(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("compile", "poetry install"),
            ("test", "poetry run pytest"),
            ("package", "poetry build"),
        ]
    }

    fn read_pin(&self, path: &Path, tool: &str) -> Result<Option<ManifestPin>> {
        let manifest_path = path.join(MANIFEST);
        let Some(toml) = parse(&path.display().to_string(), &manifest_path)? else {
            return Ok(None);
        };
        let poetry = toml.get("tool").and_then(|t| t.get("poetry"));
        let dev = poetry
            .and_then(|p| p.get("group"))
            .and_then(|g| g.get("dev"))
            .and_then(|d| d.get("dependencies"))
            .and_then(|deps| deps.get(tool))
            .and_then(version_of)
            .map(|version| ManifestPin::new(version, DependencyKind::Dev));
        let runtime = poetry
            .and_then(|p| p.get("dependencies"))
            .and_then(|deps| deps.get(tool))
            .and_then(version_of)
            .map(|version| ManifestPin::new(version, DependencyKind::Runtime));
        Ok(dev.or(runtime))
    }

    fn write_manifest(&self, project: &Project, path: &Path) -> Result<()> {
        let manifest_path = path.join(MANIFEST);
        let mut root = parse(&project.name, &manifest_path)?.unwrap_or_default();

        let poetry = table_at(&mut root, &["tool", "poetry"], &project.name)?;
        poetry
            .entry("name".to_string())
            .or_insert_with(|| Value::String(project.name.clone()));
        poetry.insert(
            "version".to_string(),
            Value::String(project.version.clone()),
        );
        poetry
            .entry("description".to_string())
            .or_insert_with(|| Value::String(String::new()));
        poetry
            .entry("authors".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        table_at(poetry, RUNTIME_SECTION, &project.name)?
            .entry("python".to_string())
            .or_insert_with(|| Value::String(DEFAULT_PYTHON.to_string()));

        for dependency in project.dependencies() {
            let spec = match &dependency.spec {
                DependencySpec::Version(version) => Value::String(version.clone()),
                DependencySpec::Path(path) => path_dependency(path),
            };
            let (section, other) = match dependency.kind {
                DependencyKind::Runtime => (RUNTIME_SECTION, DEV_SECTION),
                DependencyKind::Dev => (DEV_SECTION, RUNTIME_SECTION),
            };
            table_at(poetry, section, &project.name)?.insert(dependency.name.clone(), spec);
            remove_at(poetry, other, &dependency.name);
        }

        for reference in project.build_references() {
            table_at(poetry, RUNTIME_SECTION, &project.name)?.insert(
                reference.project.clone(),
                path_dependency(&reference.relative_path),
            );
        }

        let build_system = table_at(&mut root, &["build-system"], &project.name)?;
        build_system
            .entry("requires".to_string())
            .or_insert_with(|| Value::Array(vec![Value::String("poetry-core".to_string())]));
        build_system
            .entry("build-backend".to_string())
            .or_insert_with(|| Value::String("poetry.core.masonry.api".to_string()));

        let content = toml::to_string_pretty(&root).map_err(|e| Error::Adapter {
            project: project.name.clone(),
            message: format!("Failed to serialize {}: {}", MANIFEST, e),
        })?;
        fs::write(&manifest_path, content)?;
        Ok(())
    }
}
