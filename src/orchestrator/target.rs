//! Target selection and pre-flight repository checks.

use crate::error::{ReleaseError, Result, TerminationKind};
use crate::orchestrator::ReleaseOrchestrator;
use crate::state::ReleasePhase;

impl ReleaseOrchestrator {
    /// Locate the subject, make its directory the working root and read its metadata
    pub async fn select_target(&mut self) -> Result<()> {
        let info = self.subject.select_target(self.ctx()).await?;
        self.tools.output.info(&format!(
            "Releasing {} '{}' from {}",
            self.subject.kind(),
            info.name,
            info.path.display()
        ));
        self.state.set_subject(info)?;

        let metadata = self.subject.metadata(self.ctx()).await?;
        log::info!(
            "{} {} in {}",
            metadata.name,
            metadata.version,
            metadata.repo_name
        );
        self.state.set_metadata(metadata)?;
        self.state.advance(ReleasePhase::TargetSelected);
        Ok(())
    }

    /// Check the working root is a git work tree
    pub async fn initialise_git_client(&mut self) -> Result<()> {
        let root = self.state.working_root()?;
        self.tools.git.verify_repository(root).await?;
        log::info!("Using git remote '{}' in {}", self.params.remote, root.display());
        Ok(())
    }

    /// Refuse to release with uncommitted changes
    pub async fn verify_local_changes(&mut self) -> Result<()> {
        let root = self.state.working_root()?;
        if self.tools.git.has_local_changes(root).await? {
            return Err(ReleaseError::terminate(
                TerminationKind::Validation,
                format!(
                    "{} has uncommitted changes; commit or stash them before releasing",
                    root.display()
                ),
            ));
        }
        Ok(())
    }

    /// Sign tags when a signing key is configured
    pub async fn sign_tags(&mut self) -> Result<()> {
        let enabled = self
            .tools
            .git
            .has_signing_key_configured(self.state.working_root()?)
            .await?;
        if enabled {
            log::info!("Signing key found; tags will be signed");
        }
        self.state.set_sign_tags_enabled(enabled);
        Ok(())
    }

    /// Base and release branches must both exist
    pub async fn verify_branches(&mut self) -> Result<()> {
        let root = self.state.working_root()?;
        for branch in [&self.params.base_branch, &self.params.release_branch] {
            if !self.tools.git.has_branch(root, branch).await? {
                return Err(ReleaseError::terminate(
                    TerminationKind::Validation,
                    format!(
                        "Branch '{branch}' does not exist locally or on remote '{}'",
                        self.params.remote
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Drop remote-tracking branches deleted on the remote
    pub async fn prune_remote_origin(&mut self) -> Result<()> {
        self.tools.git.prune_remote(self.state.working_root()?).await
    }

    /// The release tag must be new
    pub async fn does_tag_exists(&mut self) -> Result<()> {
        let tag = self.state.tag()?;
        if self.tools.git.has_tag(self.state.working_root()?, tag).await? {
            return Err(ReleaseError::terminate(
                TerminationKind::Validation,
                format!("Tag {tag} already exists"),
            ));
        }
        Ok(())
    }

    /// The releasing branch must not be left over from an earlier run
    pub async fn does_releasing_branch_exists(&mut self) -> Result<()> {
        let branch = self.state.releasing_branch()?;
        if self.tools.git.has_branch(self.state.working_root()?, branch).await? {
            return Err(ReleaseError::terminate(
                TerminationKind::Validation,
                format!("Branch {branch} already exists; finish or delete the previous release first"),
            ));
        }
        Ok(())
    }
}
