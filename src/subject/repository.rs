//! Bare repositories released by tag only.

use crate::error::{ReleaseError, Result};
use crate::metadata::SubjectMetadata;
use crate::state::SubjectInfo;
use crate::subject::{SubjectContext, invalid_target, resolve_dir};
use crate::version::get_version_from_tag;
use semver::Version;
use std::path::PathBuf;

/// A repository whose artifact is the tag itself
#[derive(Debug, Clone)]
pub struct RepositorySubject {
    path: Option<PathBuf>,
}

impl RepositorySubject {
    /// Repository at `path`, or the current directory
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub(super) async fn select_target(&self, _ctx: SubjectContext<'_>) -> Result<SubjectInfo> {
        let path = resolve_dir(self.path.as_deref())?;
        if !path.is_dir() {
            return Err(invalid_target(format!("{} is not a directory", path.display())));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(SubjectInfo { name, path })
    }

    /// Identifier from the remote URL; version from the latest tag.
    ///
    /// A tag with no version in it (custom tags) reads as `0.0.0`.
    pub(super) async fn metadata(&self, ctx: SubjectContext<'_>) -> Result<SubjectMetadata> {
        let root = ctx.root()?;
        let repo_name = ctx.tools.git.get_repository_identifier(root).await?;
        let version = match ctx.tools.git.get_last_tag(root).await? {
            Some(tag) => match get_version_from_tag(&tag) {
                Ok(version) => version,
                Err(ReleaseError::Version(e)) => {
                    log::warn!("Latest tag {tag} carries no version ({e}); starting from 0.0.0");
                    Version::new(0, 0, 0)
                }
                Err(e) => return Err(e),
            },
            None => Version::new(0, 0, 0),
        };
        Ok(SubjectMetadata {
            name: repo_name.name.clone(),
            repo_name,
            version,
        })
    }
}
