//! Release subject metadata read from extension manifests and package descriptors.

use crate::error::{ReleaseError, Result, TerminationKind};
use crate::git::RepoId;
use crate::package::{DESCRIPTOR_FILE, PackageDescriptor};
use semver::Version;
use serde::Deserialize;
use std::path::Path;

/// Manifest file every extension directory carries
pub const EXTENSION_MANIFEST: &str = "extension.json";

/// What is being released
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectMetadata {
    /// Display name of the subject
    pub name: String,
    /// GitHub repository the subject lives in
    pub repo_name: RepoId,
    /// Version currently declared by the subject
    pub version: Version,
}

/// `extension.json` fields used by a release
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionManifest {
    /// Extension name
    pub name: String,
    /// Declared version
    pub version: String,
    /// Repository URL, when the manifest declares one
    #[serde(default)]
    pub repository: Option<ManifestRepository>,
}

/// `repository` as a plain string or `{ "url": ... }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ManifestRepository {
    /// `"repository": "owner/repo"`
    Url(String),
    /// `"repository": { "type": "git", "url": "..." }`
    Object {
        /// Repository URL
        url: String,
    },
}

impl ManifestRepository {
    /// The URL regardless of form
    pub fn url(&self) -> &str {
        match self {
            ManifestRepository::Url(url) => url,
            ManifestRepository::Object { url } => url,
        }
    }
}

fn invalid(path: &Path, reason: impl std::fmt::Display) -> ReleaseError {
    ReleaseError::terminate(
        TerminationKind::Validation,
        format!("Invalid {}: {reason}", path.display()),
    )
}

/// Read `extension.json` from an extension directory
pub fn read_extension_manifest(dir: &Path) -> Result<ExtensionManifest> {
    let path = dir.join(EXTENSION_MANIFEST);
    let content = std::fs::read_to_string(&path).map_err(|_| {
        ReleaseError::terminate(
            TerminationKind::Validation,
            format!("{} does not contain {EXTENSION_MANIFEST}", dir.display()),
        )
    })?;
    serde_json::from_str(&content).map_err(|e| invalid(&path, e))
}

/// Metadata for an extension; `fallback_repo` is used when the manifest has no repository
pub fn extension_metadata(manifest: &ExtensionManifest, dir: &Path, fallback_repo: Option<RepoId>) -> Result<SubjectMetadata> {
    let path = dir.join(EXTENSION_MANIFEST);
    let version = Version::parse(&manifest.version).map_err(|e| invalid(&path, format!("version '{}': {e}", manifest.version)))?;
    let repo_name = match &manifest.repository {
        Some(repository) => RepoId::parse(repository.url())?,
        None => fallback_repo.ok_or_else(|| invalid(&path, "no repository declared and no git remote found"))?,
    };

    Ok(SubjectMetadata {
        name: manifest.name.clone(),
        repo_name,
        version,
    })
}

/// Metadata for an npm package; `name`, `version` and `repository` are required
pub fn package_metadata(descriptor: &PackageDescriptor) -> Result<SubjectMetadata> {
    let path = descriptor.path();
    let name = descriptor
        .name()
        .ok_or_else(|| invalid(path, format!("{DESCRIPTOR_FILE} has no \"name\"")))?;
    let raw_version = descriptor
        .version_str()
        .ok_or_else(|| invalid(path, format!("{DESCRIPTOR_FILE} has no \"version\"")))?;
    let version = Version::parse(raw_version).map_err(|e| invalid(path, format!("version '{raw_version}': {e}")))?;
    let repository = descriptor
        .repository_url()
        .ok_or_else(|| invalid(path, format!("{DESCRIPTOR_FILE} has no \"repository\"")))?;

    Ok(SubjectMetadata {
        name: name.to_string(),
        repo_name: RepoId::parse(repository)?,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(err: &ReleaseError) -> bool {
        matches!(err.termination(), Some(t) if t.kind == TerminationKind::Validation)
    }

    #[test]
    fn test_package_metadata_requires_repository() {
        let d = PackageDescriptor::parse("package.json", r#"{"name":"a","version":"1.0.0"}"#).unwrap();
        let err = package_metadata(&d).unwrap_err();
        assert!(validation(&err));
        assert!(err.to_string().contains("repository"));
    }

    #[test]
    fn test_package_metadata_reads_repo() {
        let d = PackageDescriptor::parse(
            "package.json",
            r#"{"name":"a","version":"1.4.0","repository":"https://github.com/acme/a.git"}"#,
        )
        .unwrap();
        let meta = package_metadata(&d).unwrap();
        assert_eq!(meta.repo_name, RepoId::new("acme", "a"));
        assert_eq!(meta.version, Version::new(1, 4, 0));
    }

    #[test]
    fn test_extension_manifest_and_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(EXTENSION_MANIFEST),
            r#"{"name":"calendar","version":"0.3.1"}"#,
        )
        .unwrap();
        let manifest = read_extension_manifest(tmp.path()).unwrap();
        let meta = extension_metadata(&manifest, tmp.path(), Some(RepoId::new("acme", "calendar"))).unwrap();
        assert_eq!(meta.name, "calendar");
        assert_eq!(meta.repo_name.full_name(), "acme/calendar");

        assert!(extension_metadata(&manifest, tmp.path(), None).is_err());
    }

    #[test]
    fn test_missing_manifest_names_marker_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_extension_manifest(tmp.path()).unwrap_err();
        assert!(validation(&err));
        assert!(err.to_string().contains(EXTENSION_MANIFEST));
    }
}
