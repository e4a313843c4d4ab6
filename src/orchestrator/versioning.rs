//! Version discovery, monorepo planning and release confirmation.

use crate::error::{ReleaseError, Result, TerminationKind};
use crate::orchestrator::ReleaseOrchestrator;
use crate::state::{MonorepoPackage, ReleasePhase};
use crate::version::{BumpType, get_version_from_tag, increment_version};
use semver::Version;
use std::collections::HashSet;

/// Reason recorded for packages bumped only because a sibling changed
pub const DEPENDENCY_UPDATE_REASON: &str = "dependency update";

fn not_greater(version: &Version, last_version: &Version) -> ReleaseError {
    ReleaseError::terminate(
        TerminationKind::Validation,
        format!("Release version {version} must be greater than {last_version}"),
    )
}

/// Promote unchanged packages that depend on a changed sibling to a patch bump.
///
/// Runs a single pass: a package promoted here does not in turn promote its
/// own dependents.
pub fn propagate_dependency_updates(packages: &mut [MonorepoPackage]) {
    let changed: HashSet<String> = packages
        .iter()
        .filter(|p| !p.no_changes)
        .map(|p| p.package_name.clone())
        .collect();

    for package in packages.iter_mut().filter(|p| p.no_changes) {
        if package.dependencies.iter().any(|d| changed.contains(d)) {
            package.version = increment_version(&package.last_version, BumpType::Patch);
            package.no_changes = false;
            package.reason = DEPENDENCY_UPDATE_REASON.to_string();
        }
    }
}

impl ReleaseOrchestrator {
    /// Work out the previous release and the version, tag and releasing branch of this one
    pub async fn extract_version(&mut self) -> Result<()> {
        let root = self.state.working_root()?.to_path_buf();
        let latest_tag = self.tools.git.get_last_tag(&root).await?;

        // Custom tags need not be semver, so the subject's own version is authoritative
        let last_version = match (&self.params.release_tag, &latest_tag) {
            (Some(_), _) => self.state.metadata()?.version.clone(),
            (None, Some(tag)) => get_version_from_tag(tag)?,
            (None, None) => Version::new(0, 0, 0),
        };
        log::info!(
            "Last release: {} ({})",
            last_version,
            latest_tag.as_deref().unwrap_or("no tag yet")
        );
        self.state.set_last_release(last_version.clone(), latest_tag.clone())?;

        let version = if let Some(explicit) = &self.params.release_version {
            if *explicit <= last_version {
                return Err(not_greater(explicit, &last_version));
            }
            explicit.clone()
        } else if let Some(bump) = self.root_bump() {
            increment_version(&last_version, bump)
        } else {
            self.recommend_version(&root, &last_version, latest_tag.as_deref())
                .await?
        };

        if version <= last_version {
            return Err(not_greater(&version, &last_version));
        }

        let tag = self
            .params
            .release_tag
            .clone()
            .unwrap_or_else(|| format!("v{version}"));
        self.tools
            .output
            .success(&format!("Next version: {last_version} → {version} (tag {tag})"));
        self.state
            .set_release(version, tag, &self.params.branch_prefix)?;
        self.state.advance(ReleasePhase::VersionExtracted);
        Ok(())
    }

    /// Fixed bump for the release version itself.
    ///
    /// In monorepo mode `none` only pins the members; the root tag still
    /// follows the commit history.
    fn root_bump(&self) -> Option<BumpType> {
        match self.params.bump {
            Some(BumpType::None) if self.subject.is_monorepo() => None,
            bump => bump,
        }
    }

    async fn recommend_version(
        &self,
        root: &std::path::Path,
        last_version: &Version,
        last_tag: Option<&str>,
    ) -> Result<Version> {
        let next = self
            .tools
            .recommender
            .get_next_version(root, last_version, last_tag, None)
            .await?;
        let stats = next.recommendation.stats;
        let since = last_tag.unwrap_or("the first commit");

        if stats.is_empty() {
            let patch = increment_version(last_version, BumpType::Patch);
            if !self.params.interactive {
                return Err(ReleaseError::terminate(
                    TerminationKind::NothingToRelease,
                    format!("No commits since {since}; nothing to release"),
                ));
            }
            let question = format!("No commits since {since}. Release {patch} anyway?");
            if !self.tools.prompter.confirm(&question, false).await? {
                return Err(ReleaseError::terminate(
                    TerminationKind::UserDeclined,
                    "Release cancelled",
                ));
            }
            return Ok(patch);
        }

        if stats.only_unset() {
            self.tools.output.warn(&format!(
                "None of the {} commit(s) since {since} follow the conventional commit format",
                stats.commits
            ));
            if self.params.interactive {
                let question = format!("Proceed with a patch release ({})?", next.version);
                if !self.tools.prompter.confirm(&question, true).await? {
                    return Err(ReleaseError::terminate(
                        TerminationKind::UserDeclined,
                        "Release cancelled",
                    ));
                }
            }
        } else {
            self.tools.output.info(&next.recommendation.reason);
        }

        Ok(next.version)
    }

    /// Plan a version for every monorepo member
    pub async fn extract_monorepo_versions(&mut self) -> Result<()> {
        let root = self.state.working_root()?.to_path_buf();
        let last_tag = self.state.last_tag().map(String::from);
        let members = self.subject.monorepo_packages(self.ctx()).await?;

        let mut packages = Vec::with_capacity(members.len());
        for member in members {
            let (version, no_changes, reason) = match self.params.bump {
                Some(BumpType::None) => (member.version.clone(), true, "no bump requested".to_string()),
                Some(bump) => (
                    increment_version(&member.version, bump),
                    false,
                    format!("{bump} bump requested"),
                ),
                None => {
                    let next = self
                        .tools
                        .recommender
                        .get_next_version(&root, &member.version, last_tag.as_deref(), Some(&member.path))
                        .await?;
                    if next.recommendation.stats.is_empty() {
                        (member.version.clone(), true, "no changes".to_string())
                    } else {
                        (next.version, false, next.recommendation.reason)
                    }
                }
            };

            packages.push(MonorepoPackage {
                package_name: member.name,
                package_path: member.path,
                last_version: member.version,
                version,
                dependencies: member.dependencies,
                no_changes,
                reason,
                private: member.private,
            });
        }

        propagate_dependency_updates(&mut packages);

        self.tools.output.section("Monorepo packages");
        for p in &packages {
            if p.no_changes {
                self.tools
                    .output
                    .indent(&format!("{} {} (unchanged)", p.package_name, p.last_version));
            } else {
                self.tools.output.indent(&format!(
                    "{} {} → {} ({})",
                    p.package_name, p.last_version, p.version, p.reason
                ));
            }
        }

        self.state.set_monorepo_packages(packages)?;
        Ok(())
    }

    /// Stop when nothing changed on the base branch since the last tag
    pub async fn is_release_required(&mut self) -> Result<()> {
        let Some(last_tag) = self.state.last_tag() else {
            log::info!("No previous tag; first release");
            return Ok(());
        };
        let base = &self.params.base_branch;
        let files = self
            .tools
            .git
            .diff_between(self.state.working_root()?, last_tag, base)
            .await?;

        if !files.is_empty() {
            log::info!("{} file(s) changed since {last_tag}", files.len());
            return Ok(());
        }

        if !self.params.interactive {
            return Err(ReleaseError::terminate(
                TerminationKind::NothingToRelease,
                format!("No changes between {last_tag} and {base}; nothing to release"),
            ));
        }
        let question = format!("No changes between {last_tag} and {base}. Release anyway?");
        if !self.tools.prompter.confirm(&question, false).await? {
            return Err(ReleaseError::terminate(
                TerminationKind::UserDeclined,
                "Release cancelled",
            ));
        }
        Ok(())
    }

    /// Show the plan and, when interactive, ask to go ahead
    pub async fn confirm_release(&mut self) -> Result<()> {
        let output = &self.tools.output;
        let metadata = self.state.metadata()?;
        output.section("Release summary");
        output.indent(&format!("Subject:          {} ({})", metadata.name, metadata.repo_name));
        output.indent(&format!(
            "Version:          {} → {}",
            self.state.last_version()?,
            self.state.version()?
        ));
        output.indent(&format!("Tag:              {}", self.state.tag()?));
        output.indent(&format!("Releasing branch: {}", self.state.releasing_branch()?));
        output.indent(&format!(
            "Branches:         {} → {}",
            self.params.base_branch, self.params.release_branch
        ));
        let changed = self
            .state
            .monorepo_packages()
            .iter()
            .filter(|p| !p.no_changes)
            .count();
        if changed > 0 {
            output.indent(&format!("Packages:         {changed} to release"));
        }

        if self.params.interactive
            && !self
                .tools
                .prompter
                .confirm("Proceed with the release?", true)
                .await?
        {
            return Err(ReleaseError::terminate(
                TerminationKind::UserDeclined,
                "Release cancelled",
            ));
        }
        Ok(())
    }
}
