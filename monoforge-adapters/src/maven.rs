//! Maven adapter for `pom.xml` manifests.
//!
//! The POM is edited textually so formatting, comments and unmanaged
//! sections survive synthesis untouched.

use std::fs;
use std::path::Path;

use monoforge_core::adapter::{EcosystemAdapter, ManifestPin};
use monoforge_core::error::{Error, Result};
use monoforge_core::project::{BuildReference, DependencyKind, DependencySpec, Project};
use regex::{Match, NoExpand, Regex};
use tracing::warn;

const MANIFEST: &str = "pom.xml";
/// Group of tool dependencies declared without coordinates, e.g. the engine.
const TOOL_GROUP_ID: &str = "io.github.cdklabs";
const DEFAULT_GROUP_ID: &str = "org.acme";
/// Local repository a Maven project publishes its artifacts into on `package`.
const DIST_DIR: &str = "dist/java";

/// Adapter for Java projects built with Maven.
pub struct MavenAdapter;

fn regex(project: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Adapter {
        project: project.to_string(),
        message: format!("Failed to create regex: {}", e),
    })
}

fn skeleton(project: &Project) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
  <packaging>jar</packaging>
  <dependencies>
  </dependencies>
</project>
"#,
        project.group.as_deref().unwrap_or(DEFAULT_GROUP_ID),
        project.name,
        project.version
    )
}

struct Coordinates<'a> {
    group_id: &'a str,
    artifact_id: &'a str,
    version: &'a str,
    scope: Option<&'static str>,
}

impl Coordinates<'_> {
    fn render(&self) -> String {
        let scope = self
            .scope
            .map(|s| format!("\n      <scope>{}</scope>", s))
            .unwrap_or_default();
        format!(
            "    <dependency>\n      <groupId>{}</groupId>\n      <artifactId>{}</artifactId>\n      <version>{}</version>{}\n    </dependency>\n",
            self.group_id, self.artifact_id, self.version, scope
        )
    }
}

/// Sections whose `<dependencies>` are not the project's own.
const FOREIGN_DEPENDENCY_SECTIONS: &[&str] = &["dependencyManagement", "build", "profiles"];

/// Byte ranges of every `<tag>...</tag>` element in `pom`, for each of `tags`.
fn element_ranges(project: &str, pom: &str, tags: &[&str]) -> Result<Vec<(usize, usize)>> {
    let mut ranges = Vec::new();
    for tag in tags {
        let re = regex(project, &format!(r"(?s)<{tag}>.*?</{tag}>", tag = tag))?;
        ranges.extend(re.find_iter(pom).map(|m| (m.start(), m.end())));
    }
    Ok(ranges)
}

fn outside(ranges: &[(usize, usize)], pos: usize) -> bool {
    !ranges.iter().any(|&(start, end)| start <= pos && pos < end)
}

/// Finds the project's own `<dependency>` block for `group_id:artifact_id`.
fn find_dependency<'p>(
    project: &str,
    pom: &'p str,
    group_id: &str,
    artifact_id: &str,
) -> Result<Option<Match<'p>>> {
    let foreign = element_ranges(project, pom, FOREIGN_DEPENDENCY_SECTIONS)?;
    let block_re = regex(project, r"(?s)<dependency>.*?</dependency>")?;
    let group_re = regex(
        project,
        &format!(r"<groupId>\s*{}\s*</groupId>", regex::escape(group_id)),
    )?;
    let artifact_re = regex(
        project,
        &format!(r"<artifactId>\s*{}\s*</artifactId>", regex::escape(artifact_id)),
    )?;
    let found = block_re.find_iter(pom).find(|block| {
        outside(&foreign, block.start())
            && group_re.is_match(block.as_str())
            && artifact_re.is_match(block.as_str())
    });
    Ok(found)
}

/// Inserts `rendered` at the end of the last `<wrapper>` section outside
/// `excluded`, or in a new `<wrapper>` section before `</project>`.
fn append_to_section(
    project: &str,
    pom: &str,
    wrapper: &str,
    excluded: &[(usize, usize)],
    rendered: &str,
) -> Result<String> {
    let closing = format!("</{}>", wrapper);
    let section_end = pom
        .match_indices(&closing)
        .map(|(pos, _)| pos)
        .filter(|&pos| outside(excluded, pos))
        .last();
    if let Some(pos) = section_end {
        let line_start = pom[..pos].rfind('\n').map(|i| i + 1).unwrap_or(pos);
        let insert_at = if pom[line_start..pos].trim().is_empty() {
            line_start
        } else {
            pos
        };
        return Ok(format!("{}{}{}", &pom[..insert_at], rendered, &pom[insert_at..]));
    }
    if let Some(pos) = pom.rfind("</project>") {
        return Ok(format!(
            "{}  <{}>\n{}  {}\n{}",
            &pom[..pos],
            wrapper,
            rendered,
            closing,
            &pom[pos..]
        ));
    }
    Err(Error::Adapter {
        project: project.to_string(),
        message: format!("{} has no closing </project> element", MANIFEST),
    })
}

/// Declares or re-versions one `<dependency>` in `pom`.
fn upsert_dependency(project: &str, pom: &str, dependency: &Coordinates<'_>) -> Result<String> {
    if let Some(block) = find_dependency(project, pom, dependency.group_id, dependency.artifact_id)? {
        let version_re = regex(project, r"<version>[^<]*</version>")?;
        let version = format!("<version>{}</version>", dependency.version);
        let updated = if version_re.is_match(block.as_str()) {
            version_re
                .replace(block.as_str(), NoExpand(&version))
                .into_owned()
        } else {
            block
                .as_str()
                .replace("</dependency>", &format!("  {}\n    </dependency>", version))
        };
        return Ok(format!(
            "{}{}{}",
            &pom[..block.start()],
            updated,
            &pom[block.end()..]
        ));
    }

    let foreign = element_ranges(project, pom, FOREIGN_DEPENDENCY_SECTIONS)?;
    append_to_section(project, pom, "dependencies", &foreign, &dependency.render())
}

/// Declares the dependee's local output as a file repository so Maven
/// resolves it without a prior `mvn install`.
fn upsert_repository(project: &str, pom: &str, reference: &BuildReference) -> Result<String> {
    let url = format!(
        "file://{}/{}",
        reference.relative_path.to_string_lossy().replace('\\', "/"),
        DIST_DIR
    );
    let foreign = element_ranges(project, pom, &["distributionManagement", "profiles"])?;
    let block_re = regex(project, r"(?s)<repository>.*?</repository>")?;
    let id_re = regex(
        project,
        &format!(r"<id>\s*{}\s*</id>", regex::escape(&reference.project)),
    )?;

    if let Some(block) = block_re
        .find_iter(pom)
        .find(|block| outside(&foreign, block.start()) && id_re.is_match(block.as_str()))
    {
        let url_re = regex(project, r"<url>[^<]*</url>")?;
        let updated = url_re
            .replace(block.as_str(), NoExpand(&format!("<url>{}</url>", url)))
            .into_owned();
        return Ok(format!(
            "{}{}{}",
            &pom[..block.start()],
            updated,
            &pom[block.end()..]
        ));
    }

    let rendered = format!(
        "    <repository>\n      <id>{}</id>\n      <url>{}</url>\n    </repository>\n",
        reference.project, url
    );
    append_to_section(project, pom, "repositories", &foreign, &rendered)
}

/// Rewrites the project's own `<version>`, the one following its artifact id.
fn set_project_version(project: &Project, pom: &str) -> Result<String> {
    let re = regex(
        &project.name,
        &format!(
            r"(<artifactId>\s*{}\s*</artifactId>\s*<version>)[^<]*(</version>)",
            regex::escape(&project.name)
        ),
    )?;
    Ok(re
        .replace(pom, |caps: &regex::Captures<'_>| {
            format!("{}{}{}", &caps[1], project.version, &caps[2])
        })
        .into_owned())
}

impl EcosystemAdapter for MavenAdapter {
    fn manifest_file(&self) -> &'static str {
        MANIFEST
    }

    fn lifecycle_commands(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("compile", "mvn compile"),
            ("test", "mvn test"),
            ("package", "mvn package -DskipTests"),
        ]
    }

    fn read_pin(&self, path: &Path, tool: &str) -> Result<Option<ManifestPin>> {
        let pom_path = path.join(MANIFEST);
        if !pom_path.exists() {
            return Ok(None);
        }
        let label = path.display().to_string();
        let content = fs::read_to_string(&pom_path)?;

        let (group_id, artifact_id) = tool.split_once(':').unwrap_or((TOOL_GROUP_ID, tool));
        let Some(block) = find_dependency(&label, &content, group_id, artifact_id)? else {
            return Ok(None);
        };
        let version_re = regex(&label, r"<version>\s*([^<\s]+)\s*</version>")?;
        let scope_re = regex(&label, r"<scope>\s*test\s*</scope>")?;
        let kind = if scope_re.is_match(block.as_str()) {
            DependencyKind::Dev
        } else {
            DependencyKind::Runtime
        };
        Ok(version_re
            .captures(block.as_str())
            .map(|caps| ManifestPin::new(&caps[1], kind)))
    }

    fn write_manifest(&self, project: &Project, path: &Path) -> Result<()> {
        let pom_path = path.join(MANIFEST);
        let mut pom = if pom_path.exists() {
            let existing = fs::read_to_string(&pom_path)?;
            set_project_version(project, &existing)?
        } else {
            skeleton(project)
        };

        for dependency in project.dependencies() {
            let version = match &dependency.spec {
                DependencySpec::Version(version) => version,
                DependencySpec::Path(dep_path) => {
                    warn!(
                        project = %project.name,
                        dependency = %dependency.name,
                        path = %dep_path.display(),
                        "Maven cannot resolve path dependencies; declare a same-ecosystem dependency instead"
                    );
                    continue;
                }
            };
            let scope = match dependency.kind {
                DependencyKind::Runtime => None,
                DependencyKind::Dev => Some("test"),
            };
            let (group_id, artifact_id) = dependency
                .name
                .split_once(':')
                .unwrap_or((TOOL_GROUP_ID, dependency.name.as_str()));
            pom = upsert_dependency(
                &project.name,
                &pom,
                &Coordinates {
                    group_id,
                    artifact_id,
                    version,
                    scope,
                },
            )?;
        }

        for reference in project.build_references() {
            pom = upsert_dependency(
                &project.name,
                &pom,
                &Coordinates {
                    group_id: reference
                        .group
                        .as_deref()
                        .or(project.group.as_deref())
                        .unwrap_or(DEFAULT_GROUP_ID),
                    artifact_id: &reference.project,
                    version: &reference.version,
                    scope: None,
                },
            )?;
            pom = upsert_repository(&project.name, &pom, reference)?;
        }

        fs::write(&pom_path, pom)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monoforge_core::graph::WorkspaceGraph;
    use monoforge_core::project::Language;
    use monoforge_core::registrar::add_same_ecosystem_dependency;
    use tempfile::TempDir;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>service</artifactId>
  <version>1.0.0</version>
  <!-- keep me -->
  <dependencies>
    <dependency>
      <groupId>io.github.cdklabs</groupId>
      <artifactId>projen</artifactId>
      <version>0.70.0</version>
      <scope>test</scope>
    </dependency>
  </dependencies>
</project>
"#;

    #[test]
    fn test_read_pin() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("pom.xml"), POM).unwrap();

        let adapter = MavenAdapter;
        assert!(adapter.detect(temp_dir.path()));
        assert_eq!(
            adapter.read_pin(temp_dir.path(), "projen").unwrap(),
            Some(ManifestPin::new("0.70.0", DependencyKind::Dev))
        );
        assert_eq!(adapter.read_pin(temp_dir.path(), "junit").unwrap(), None);
    }

    #[test]
    fn test_write_manifest_repins_in_place() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("pom.xml"), POM).unwrap();

        let mut project = Project::new("service", Language::Java, "service").with_version("1.1.0");
        project.add_version_dependency("projen", "0.79.3", DependencyKind::Dev);
        MavenAdapter.write_manifest(&project, temp_dir.path()).unwrap();

        let pom = fs::read_to_string(temp_dir.path().join("pom.xml")).unwrap();
        assert!(pom.contains("<version>0.79.3</version>"));
        assert!(!pom.contains("0.70.0"));
        assert!(pom.contains("<version>1.1.0</version>"));
        assert!(pom.contains("<!-- keep me -->"));
        assert_eq!(pom.matches("<artifactId>projen</artifactId>").count(), 1);
    }

    #[test]
    fn test_write_manifest_adds_build_reference() {
        let temp_dir = TempDir::new().unwrap();
        let mut graph = WorkspaceGraph::new(Project::new("root", Language::TypeScript, "."));
        let lib = graph
            .register_project(
                Project::new("lib", Language::Java, "lib")
                    .with_group("com.example")
                    .with_version("2.0.0"),
            )
            .unwrap();
        let app = graph
            .register_project(Project::new("app", Language::Java, "app"))
            .unwrap();
        add_same_ecosystem_dependency(&mut graph, app, lib).unwrap();

        MavenAdapter
            .write_manifest(graph.get(app).unwrap(), temp_dir.path())
            .unwrap();

        let pom = fs::read_to_string(temp_dir.path().join("pom.xml")).unwrap();
        assert!(pom.contains("<artifactId>app</artifactId>"));
        assert!(pom.contains("<groupId>com.example</groupId>"));
        assert!(pom.contains("<artifactId>lib</artifactId>"));
        assert!(pom.contains("<version>2.0.0</version>"));
        assert!(pom.contains("<repositories>"));
        assert!(pom.contains("<id>lib</id>"));
        assert!(pom.contains("<url>file://../lib/dist/java</url>"));
        assert!(pom.trim_end().ends_with("</project>"));

        MavenAdapter
            .write_manifest(graph.get(app).unwrap(), temp_dir.path())
            .unwrap();
        let again = fs::read_to_string(temp_dir.path().join("pom.xml")).unwrap();
        assert_eq!(again.matches("<repository>").count(), 1);
        assert_eq!(again.matches("<artifactId>lib</artifactId>").count(), 1);
    }

    #[test]
    fn test_upsert_matches_group_and_skips_managed_versions() {
        let pom = r#"<project>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>io.github.cdklabs</groupId>
        <artifactId>projen</artifactId>
        <version>0.10.0</version>
      </dependency>
    </dependencies>
  </dependencyManagement>
  <dependencies>
    <dependency>
      <groupId>org.other</groupId>
      <artifactId>projen</artifactId>
      <version>9.9.9</version>
    </dependency>
  </dependencies>
</project>
"#;
        let updated = upsert_dependency(
            "svc",
            pom,
            &Coordinates {
                group_id: TOOL_GROUP_ID,
                artifact_id: "projen",
                version: "0.79.3",
                scope: Some("test"),
            },
        )
        .unwrap();

        assert!(updated.contains("<version>0.10.0</version>"));
        assert!(updated.contains("<version>9.9.9</version>"));
        assert!(updated.contains("<version>0.79.3</version>"));
        let managed_end = updated.find("</dependencyManagement>").unwrap();
        let inserted = updated.find("<version>0.79.3</version>").unwrap();
        assert!(inserted > managed_end);
    }

    #[test]
    fn test_read_pin_runtime_scope() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("pom.xml"), POM.replace("      <scope>test</scope>\n", ""))
            .unwrap();

        assert_eq!(
            MavenAdapter.read_pin(temp_dir.path(), "projen").unwrap(),
            Some(ManifestPin::new("0.70.0", DependencyKind::Runtime))
        );
    }

    #[test]
    fn test_write_manifest_skips_path_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        let mut graph = WorkspaceGraph::new(Project::new("root", Language::TypeScript, "."));
        let web = graph
            .register_project(Project::new("web", Language::TypeScript, "web"))
            .unwrap();
        let app = graph
            .register_project(Project::new("app", Language::Java, "app"))
            .unwrap();
        monoforge_core::registrar::add_cross_ecosystem_package_dependency(&mut graph, app, web)
            .unwrap();

        MavenAdapter
            .write_manifest(graph.get(app).unwrap(), temp_dir.path())
            .unwrap();

        let pom = fs::read_to_string(temp_dir.path().join("pom.xml")).unwrap();
        assert!(!pom.contains("<artifactId>web</artifactId>"));
    }

    #[test]
    fn test_upsert_without_dependencies_section() {
        let pom = "<project>\n  <artifactId>x</artifactId>\n</project>\n";
        let updated = upsert_dependency(
            "x",
            pom,
            &Coordinates {
                group_id: "g",
                artifact_id: "a",
                version: "1.0",
                scope: None,
            },
        )
        .unwrap();
        assert!(updated.contains("<dependencies>"));
        assert!(updated.contains("<artifactId>a</artifactId>"));
        assert!(upsert_dependency("x", "<pom/>", &Coordinates {
            group_id: "g",
            artifact_id: "a",
            version: "1.0",
            scope: None,
        })
        .is_err());
    }
}
