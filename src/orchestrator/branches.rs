//! Releasing branch lifecycle, tagging and merges with conflict recovery.

use crate::error::{ReleaseError, Result, TerminationKind};
use crate::orchestrator::ReleaseOrchestrator;
use crate::state::ReleasePhase;

impl ReleaseOrchestrator {
    /// Branch `{prefix}-{version}` off an up-to-date base branch
    pub async fn create_releasing_branch(&mut self) -> Result<()> {
        let root = self.state.working_root()?;
        let branch = self.state.releasing_branch()?;
        self.tools.git.pull(root, &self.params.base_branch).await?;
        self.tools.git.create_local_branch(root, branch).await?;
        self.tools
            .output
            .success(&format!("Created {branch} from {}", self.params.base_branch));
        self.state.advance(ReleasePhase::BranchCreated);
        Ok(())
    }

    /// Merge the releasing branch into the release branch without a pull request
    pub async fn merge_with_release_branch(&mut self) -> Result<()> {
        let root = self.state.working_root()?;
        let target = &self.params.release_branch;
        let releasing = self.state.releasing_branch()?;

        match self.tools.git.merge_as_pull_request(root, target, releasing).await {
            Ok(()) => self.tools.git.push(root, target).await?,
            Err(e) => self.recover_from_conflict(e, target).await?,
        }
        self.tools
            .output
            .success(&format!("Merged {releasing} into {target}"));
        self.state.advance(ReleasePhase::PRMerged);
        Ok(())
    }

    /// Tag the release branch and push the tag
    pub async fn create_release_tag(&mut self) -> Result<()> {
        let tag = self.state.tag()?;
        let comment = self
            .params
            .comment
            .clone()
            .unwrap_or_else(|| format!("Release {tag}"));
        let signed = self.state.sign_tags_enabled();
        self.tools
            .git
            .create_and_push_tag(
                self.state.working_root()?,
                &self.params.release_branch,
                tag,
                &comment,
                signed,
            )
            .await?;
        self.tools.output.success(&format!(
            "Pushed {}tag {tag}",
            if signed { "signed " } else { "" }
        ));
        self.state.advance(ReleasePhase::Tagged);
        Ok(())
    }

    /// Merge the release branch back into the base branch
    pub async fn merge_back(&mut self) -> Result<()> {
        let root = self.state.working_root()?;
        let base = &self.params.base_branch;
        let released = &self.params.release_branch;

        match self.tools.git.merge_back(root, base, released).await {
            Ok(()) => self.tools.git.push(root, base).await?,
            Err(e) => self.recover_from_conflict(e, base).await?,
        }
        self.tools
            .output
            .success(&format!("Merged {released} back into {base}"));
        self.state.advance(ReleasePhase::MergedBack);
        Ok(())
    }

    /// Delete the releasing branch locally and on the remote
    pub async fn remove_releasing_branch(&mut self) -> Result<()> {
        let branch = self.state.releasing_branch()?;
        self.tools
            .git
            .delete_branch(self.state.working_root()?, branch)
            .await?;
        log::info!("Removed {branch}");
        self.state.advance(ReleasePhase::BranchRemoved);
        Ok(())
    }

    /// Let the operator resolve a merge conflict by hand, then push `branch`.
    ///
    /// Errors other than conflicts are returned unchanged. Non-interactive runs
    /// stop immediately. The operator is asked once; `branch` is pushed only
    /// when they confirm and the work tree is clean.
    async fn recover_from_conflict(&self, error: ReleaseError, branch: &str) -> Result<()> {
        let conflict = match &error {
            ReleaseError::Git(git) if git.is_conflict() => git.to_string(),
            _ => return Err(error),
        };

        if !self.params.interactive {
            return Err(ReleaseError::terminate(
                TerminationKind::MergeConflict,
                format!("Merging into {branch} stopped on conflicts. {conflict}"),
            ));
        }

        let root = self.state.working_root()?;
        let output = &self.tools.output;
        output.warn(&conflict);
        output.println("The merge stopped on conflicts. To continue:");
        output.indent(&format!("1. Resolve the conflicting files in {}", root.display()));
        output.indent("2. Stage them with git add and finish the merge with git commit");
        output.indent(&format!("3. Do not push; {branch} is pushed once you confirm"));

        if !self
            .tools
            .prompter
            .confirm("Are the conflicts resolved and committed?", false)
            .await?
        {
            self.tools.git.abort_merge(root).await?;
            return Err(ReleaseError::terminate(
                TerminationKind::UserDeclined,
                format!("Merge into {branch} aborted"),
            ));
        }

        if self.tools.git.has_local_changes(root).await? {
            return Err(ReleaseError::terminate(
                TerminationKind::Validation,
                format!("Uncommitted changes remain in {}; {branch} was not pushed", root.display()),
            ));
        }

        self.tools.git.push(root, branch).await
    }
}
