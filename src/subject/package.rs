//! npm packages and npm workspace monorepos.

use crate::error::{ReleaseError, Result, TerminationKind};
use crate::metadata::{SubjectMetadata, package_metadata};
use crate::package::{DESCRIPTOR_FILE, MonorepoMember, publish_order};
use crate::state::{MonorepoPackage, SubjectInfo};
use crate::subject::{BuildTask, SubjectContext, invalid_target, resolve_dir};
use semver::Version;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// npm package at a directory, optionally a workspace root
#[derive(Debug, Clone)]
pub struct PackageSubject {
    path: Option<PathBuf>,
    registry: Option<String>,
    monorepo: bool,
}

impl PackageSubject {
    /// Package at `path` (or the current directory)
    pub fn new(path: Option<PathBuf>, registry: Option<String>, monorepo: bool) -> Self {
        Self {
            path,
            registry,
            monorepo,
        }
    }

    /// Whether the package is a workspace root released member by member
    pub fn is_monorepo(&self) -> bool {
        self.monorepo
    }

    pub(super) async fn select_target(&self, ctx: SubjectContext<'_>) -> Result<SubjectInfo> {
        let path = resolve_dir(self.path.as_deref())?;
        if !path.join(DESCRIPTOR_FILE).is_file() {
            return Err(invalid_target(format!(
                "{} is not a package: {DESCRIPTOR_FILE} is missing",
                path.display()
            )));
        }
        let descriptor = ctx.tools.package_manager.read_descriptor(&path).await?;
        let name = descriptor
            .name()
            .map(String::from)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_default();
        Ok(SubjectInfo { name, path })
    }

    pub(super) async fn metadata(&self, ctx: SubjectContext<'_>) -> Result<SubjectMetadata> {
        let descriptor = ctx.tools.package_manager.read_descriptor(ctx.root()?).await?;
        package_metadata(&descriptor)
    }

    pub(super) async fn build_tasks(&self, ctx: SubjectContext<'_>) -> Result<Vec<BuildTask>> {
        let descriptor = ctx.tools.package_manager.read_descriptor(ctx.root()?).await?;
        let mut tasks = vec![BuildTask::Install];
        if descriptor.has_script("build") {
            tasks.push(BuildTask::Build);
        } else {
            log::debug!("{} has no build script", descriptor.path().display());
        }
        Ok(tasks)
    }

    pub(super) async fn update_version(&self, ctx: SubjectContext<'_>, version: &Version) -> Result<()> {
        ctx.tools.package_manager.update_version(ctx.root()?, version).await
    }

    /// Remind about registry prerequisites and, when interactive, ask before publishing
    async fn confirm_publish(&self, ctx: SubjectContext<'_>, what: &str) -> Result<()> {
        let registry = self.registry.as_deref().unwrap_or("the default npm registry");
        ctx.tools.output.warn(&format!(
            "Publishing to {registry} requires being logged in (npm whoami) with publish rights on the package scope"
        ));
        if ctx.interactive && !ctx.tools.prompter.confirm(&format!("Publish {what}?"), true).await? {
            return Err(ReleaseError::terminate(
                TerminationKind::UserDeclined,
                format!("Publishing skipped; the release is tagged, publish {what} manually when ready"),
            ));
        }
        Ok(())
    }

    pub(super) async fn publish(&self, ctx: SubjectContext<'_>) -> Result<()> {
        let what = format!("{}@{}", ctx.state.subject()?.name, ctx.state.version()?);
        self.confirm_publish(ctx, &what).await?;
        ctx.tools
            .package_manager
            .publish(ctx.root()?, self.registry.as_deref())
            .await?;
        ctx.tools.output.success(&format!("Published {what}"));
        Ok(())
    }

    pub(super) async fn monorepo_packages(&self, ctx: SubjectContext<'_>) -> Result<Vec<MonorepoMember>> {
        ctx.tools.package_manager.list_monorepo_members(ctx.root()?).await
    }

    /// Write every planned version and point sibling ranges at the new versions.
    ///
    /// The lock file is refreshed once, after all descriptors are written.
    pub(super) async fn monorepo_update_versions(
        &self,
        ctx: SubjectContext<'_>,
        packages: &[MonorepoPackage],
        root_version: &Version,
    ) -> Result<()> {
        let root = ctx.root()?;
        let pm = &ctx.tools.package_manager;
        let changed: BTreeMap<&str, &Version> = packages
            .iter()
            .filter(|p| !p.no_changes)
            .map(|p| (p.package_name.as_str(), &p.version))
            .collect();

        for package in packages {
            let original = pm.read_descriptor(&root.join(&package.package_path)).await?;
            let mut descriptor = original.clone();
            if !package.no_changes {
                descriptor.set_version(&package.version);
            }
            for (dependency, version) in &changed {
                descriptor.set_dependency_version(dependency, version);
            }
            if descriptor != original {
                log::info!("Updating {} to {}", package.package_name, package.version);
                pm.write_descriptor(&descriptor).await?;
            }
        }

        let mut root_descriptor = pm.read_descriptor(root).await?;
        root_descriptor.set_version(root_version);
        for (dependency, version) in &changed {
            root_descriptor.set_dependency_version(dependency, version);
        }
        pm.write_descriptor(&root_descriptor).await?;

        pm.refresh_lock_file(root).await
    }

    pub(super) async fn monorepo_publish(&self, ctx: SubjectContext<'_>, packages: &[MonorepoPackage]) -> Result<()> {
        let members: Vec<MonorepoMember> = packages
            .iter()
            .filter(|p| !p.no_changes && !p.private)
            .map(|p| MonorepoMember {
                name: p.package_name.clone(),
                path: p.package_path.clone(),
                version: p.version.clone(),
                dependencies: p.dependencies.clone(),
                private: p.private,
            })
            .collect();

        if members.is_empty() {
            ctx.tools.output.info("No changed public package to publish");
            return Ok(());
        }

        let ordered = publish_order(&members)?;
        let what = ordered
            .iter()
            .map(|m| format!("{}@{}", m.name, m.version))
            .collect::<Vec<_>>()
            .join(", ");
        self.confirm_publish(ctx, &what).await?;

        ctx.tools
            .package_manager
            .publish_all(ctx.root()?, &ordered, self.registry.as_deref())
            .await?;
        ctx.tools
            .output
            .success(&format!("Published {} package(s)", ordered.len()));
        Ok(())
    }
}
