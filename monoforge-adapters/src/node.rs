//! Node adapter for `package.json` manifests.

use std::fs;
use std::path::Path;

use monoforge_core::adapter::{EcosystemAdapter, ManifestPin};
use monoforge_core::error::{Error, Result};
use monoforge_core::project::{DependencyKind, DependencySpec, Project};
use serde_json::{Map, Value};

const MANIFEST: &str = "package.json";

/// Adapter for TypeScript and JavaScript projects.
pub struct NodeAdapter;

fn set_entry(root: &mut Map<String, Value>, section: &str, name: &str, spec: String) {
    let entry = root
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(deps) = entry {
        deps.insert(name.to_string(), Value::String(spec));
    }
}

fn remove_entry(root: &mut Map<String, Value>, section: &str, name: &str) {
    if let Some(Value::Object(deps)) = root.get_mut(section) {
        deps.remove(name);
    }
}

fn section_of(kind: DependencyKind) -> (&'static str, &'static str) {
    match kind {
        DependencyKind::Runtime => ("dependencies", "devDependencies"),
        DependencyKind::Dev => ("devDependencies", "dependencies"),
    }
}

fn file_spec(path: &Path) -> String {
    format!("file:{}", path.to_string_lossy().replace('\\', "/"))
}

fn read_manifest(project: &str, path: &Path) -> Result<Option<Value>> {
    let manifest_path = path.join(MANIFEST);
    if !manifest_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&manifest_path)?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::Adapter {
            project: project.to_string(),
            message: format!("Failed to parse {}: {}", manifest_path.display(), e),
        })
}

impl EcosystemAdapter for NodeAdapter {
    fn manifest_file(&self) -> &'static str {
        MANIFEST
    }

    fn lifecycle_commands(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("compile", "npm run build --if-present"),
            ("test", "npm test --if-present"),
            ("package", "npm pack --pack-destination dist"),
        ]
    }

    fn read_pin(&self, path: &Path, tool: &str) -> Result<Option<ManifestPin>> {
        let Some(json) = read_manifest(&path.display().to_string(), path)? else {
            return Ok(None);
        };
        let pin = [
            ("devDependencies", DependencyKind::Dev),
            ("dependencies", DependencyKind::Runtime),
        ]
        .into_iter()
        .find_map(|(key, kind)| {
            json.get(key)
                .and_then(|deps| deps.get(tool))
                .and_then(|v| v.as_str())
                .map(|version| ManifestPin::new(version, kind))
        });
        Ok(pin)
    }

    fn write_manifest(&self, project: &Project, path: &Path) -> Result<()> {
        let mut json =
            read_manifest(&project.name, path)?.unwrap_or_else(|| Value::Object(Map::new()));
        if !json.is_object() {
            return Err(Error::Adapter {
                project: project.name.clone(),
                message: format!("{} is not a JSON object", path.join(MANIFEST).display()),
            });
        }

        if let Value::Object(ref mut root) = json {
            root.entry("name")
                .or_insert_with(|| Value::String(project.name.clone()));
            root.insert("version".to_string(), Value::String(project.version.clone()));

            for dependency in project.dependencies() {
                let (key, other) = section_of(dependency.kind);
                let spec = match &dependency.spec {
                    DependencySpec::Version(version) => version.clone(),
                    DependencySpec::Path(path) => file_spec(path),
                };
                set_entry(root, key, &dependency.name, spec);
                remove_entry(root, other, &dependency.name);
            }

            for reference in project.build_references() {
                set_entry(
                    root,
                    "dependencies",
                    &reference.project,
                    file_spec(&reference.relative_path),
                );
            }
        }

        let mut content = serde_json::to_string_pretty(&json)?;
        content.push('\n');
        fs::write(path.join(MANIFEST), content)?;
        Ok(())
    }
}
