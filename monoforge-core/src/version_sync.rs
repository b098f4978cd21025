//! Workspace-wide pinning of the generation engine version.

use semver::VersionReq;
use tracing::debug;

use crate::error::{Error, Result};
use crate::project::{DependencySpec, Project};

/// A pin that was rewritten by [`sync_versions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedPin {
    pub project: String,
    pub previous: String,
    pub version: String,
}

/// Validates that `version` is a usable version requirement for `tool`.
pub fn validate_version(tool: &str, version: &str) -> Result<()> {
    VersionReq::parse(version)
        .map(|_| ())
        .map_err(|e| Error::InvalidVersion {
            tool: tool.to_string(),
            version: version.to_string(),
            message: e.to_string(),
        })
}

/// Rewrites the declared `tool` version of every project that declares it.
///
/// Projects that do not depend on `tool` are left untouched. Returns the pins
/// whose value actually changed.
///
/// # Errors
///
/// Returns an error if `version` is not a valid version requirement.
pub fn sync_versions<'a, I>(projects: I, tool: &str, version: &str) -> Result<Vec<SyncedPin>>
where
    I: IntoIterator<Item = &'a mut Project>,
{
    validate_version(tool, version)?;

    let mut synced = Vec::new();
    for project in projects {
        let Some(previous) = project.repin(tool, version) else {
            continue;
        };
        let previous = match previous {
            DependencySpec::Version(v) if v == version => continue,
            DependencySpec::Version(v) => v,
            DependencySpec::Path(p) => p.display().to_string(),
        };
        debug!(project = %project.name, tool, from = %previous, to = version, "synced engine version");
        synced.push(SyncedPin {
            project: project.name.clone(),
            previous,
            version: version.to_string(),
        });
    }
    Ok(synced)
}
