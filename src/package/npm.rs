//! `PackageManager` backed by the system `npm` executable.

use crate::error::{PackageError, Result};
use crate::package::{DESCRIPTOR_FILE, MonorepoMember, PackageDescriptor, PackageManager};
use crate::process;
use async_trait::async_trait;
use semver::Version;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// npm command-line wrapper
#[derive(Debug, Clone, Default)]
pub struct Npm {
    npm: Option<PathBuf>,
}

impl Npm {
    /// Locate `npm` in PATH.
    ///
    /// A missing binary only fails the first command that needs it, so
    /// releases that never run npm work without it.
    pub fn new() -> Self {
        let npm = which::which("npm").ok();
        if npm.is_none() {
            log::debug!("npm not found in PATH");
        }
        Self { npm }
    }

    async fn checked(&self, root: &Path, args: &[&str]) -> Result<()> {
        let npm = self.npm.as_deref().ok_or(PackageError::NpmNotFound)?;
        let output = process::run(npm, args, root).await?;
        if !output.success {
            return Err(PackageError::CommandFailed {
                command: args.join(" "),
                reason: output.failure_reason(),
            }
            .into());
        }
        Ok(())
    }
}

/// Expand workspace globs of the monorepo in `root` into member directories
fn member_dirs(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut seen = HashSet::new();
    for pattern in patterns {
        let full = root.join(pattern).join(DESCRIPTOR_FILE);
        let full = full.to_string_lossy();
        let entries = glob::glob(&full).map_err(|e| PackageError::InvalidWorkspacePattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        for entry in entries {
            let descriptor = entry.map_err(|e| PackageError::InvalidWorkspacePattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            if let Some(dir) = descriptor.parent()
                && seen.insert(dir.to_path_buf())
            {
                dirs.push(dir.to_path_buf());
            }
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[async_trait]
impl PackageManager for Npm {
    async fn install(&self, root: &Path) -> Result<()> {
        self.checked(root, &["install"]).await
    }

    async fn run_script(&self, root: &Path, script: &str) -> Result<()> {
        self.checked(root, &["run", script]).await
    }

    async fn publish(&self, root: &Path, registry: Option<&str>) -> Result<()> {
        match registry {
            Some(registry) => self.checked(root, &["publish", "--registry", registry]).await,
            None => self.checked(root, &["publish"]).await,
        }
    }

    async fn read_descriptor(&self, root: &Path) -> Result<PackageDescriptor> {
        let path = root.join(DESCRIPTOR_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PackageError::InvalidDescriptor {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        PackageDescriptor::parse(path, &content)
    }

    async fn write_descriptor(&self, descriptor: &PackageDescriptor) -> Result<()> {
        tokio::fs::write(descriptor.path(), descriptor.to_pretty_string()?).await?;
        Ok(())
    }

    async fn update_version(&self, root: &Path, version: &Version) -> Result<()> {
        let version = version.to_string();
        self.checked(
            root,
            &["version", &version, "--no-git-tag-version", "--allow-same-version"],
        )
        .await
    }

    async fn refresh_lock_file(&self, root: &Path) -> Result<()> {
        self.checked(root, &["install", "--package-lock-only", "--ignore-scripts"])
            .await
    }

    async fn list_monorepo_members(&self, root: &Path) -> Result<Vec<MonorepoMember>> {
        let root_descriptor = self.read_descriptor(root).await?;
        let patterns = root_descriptor.workspaces();
        if patterns.is_empty() {
            return Err(PackageError::InvalidDescriptor {
                path: root_descriptor.path().to_path_buf(),
                reason: "no \"workspaces\" declared".to_string(),
            }
            .into());
        }

        let mut descriptors = Vec::new();
        for dir in member_dirs(root, &patterns)? {
            descriptors.push((dir.clone(), self.read_descriptor(&dir).await?));
        }

        let names: HashSet<String> = descriptors
            .iter()
            .filter_map(|(_, d)| d.name().map(String::from))
            .collect();

        let mut members = Vec::new();
        for (dir, descriptor) in descriptors {
            let name = descriptor
                .name()
                .ok_or_else(|| PackageError::InvalidDescriptor {
                    path: descriptor.path().to_path_buf(),
                    reason: "missing \"name\"".to_string(),
                })?
                .to_string();
            let mut dependencies: Vec<String> = descriptor
                .dependency_names()
                .into_iter()
                .filter(|d| names.contains(d) && *d != name)
                .collect();
            dependencies.sort();
            dependencies.dedup();

            members.push(MonorepoMember {
                path: dir.strip_prefix(root).unwrap_or(&dir).to_path_buf(),
                version: descriptor.version()?,
                private: descriptor.is_private(),
                dependencies,
                name,
            });
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_member_dirs_expands_globs() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "packages/a/package.json", "{}");
        write(tmp.path(), "packages/b/package.json", "{}");
        write(tmp.path(), "packages/not-a-package/README.md", "");
        let dirs = member_dirs(tmp.path(), &["packages/*".to_string()]).unwrap();
        assert_eq!(dirs.len(), 2);
        assert!(dirs[0].ends_with("packages/a"));
    }

    #[tokio::test]
    async fn test_list_members_links_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", r#"{"name":"root","version":"1.0.0","workspaces":["packages/*"]}"#);
        write(
            tmp.path(),
            "packages/core/package.json",
            r#"{"name":"@x/core","version":"1.0.0"}"#,
        );
        write(
            tmp.path(),
            "packages/ui/package.json",
            r#"{"name":"@x/ui","version":"2.1.0","dependencies":{"@x/core":"^1.0.0","react":"^18.0.0"}}"#,
        );

        // Descriptor reads do not invoke the npm binary
        let npm = Npm { npm: None };
        let members = npm.list_monorepo_members(tmp.path()).await.unwrap();
        assert_eq!(members.len(), 2);
        let ui = members.iter().find(|m| m.name == "@x/ui").unwrap();
        assert_eq!(ui.dependencies, vec!["@x/core".to_string()]);
        assert_eq!(ui.version, Version::new(2, 1, 0));
        assert_eq!(ui.path, PathBuf::from("packages/ui"));
    }
}
