//! Building, versioning and publishing the subject.

use crate::error::Result;
use crate::orchestrator::{FailurePolicy, ReleaseOrchestrator, failure_policy};
use crate::state::ReleasePhase;

impl ReleaseOrchestrator {
    /// Run the subject's build tasks under the failure policy table
    pub async fn build(&mut self) -> Result<()> {
        let tasks = self.subject.build_tasks(self.ctx()).await?;
        for task in tasks {
            self.tools.output.progress(&format!("Running {task}"));
            if let Err(e) = self.subject.run_build_task(self.ctx(), task).await {
                match failure_policy(task) {
                    FailurePolicy::LogAndContinue => {
                        log::warn!("{task} failed: {e}");
                        self.tools
                            .output
                            .warn(&format!("{task} failed, continuing without it: {e}"));
                    }
                    FailurePolicy::Propagate => return Err(e),
                }
            }
        }
        self.state.advance(ReleasePhase::Built);
        Ok(())
    }

    /// Persist the new version and push it on the releasing branch
    pub async fn update_version(&mut self) -> Result<()> {
        let version = self.state.version()?;
        if self.subject.is_monorepo() {
            self.subject
                .monorepo_update_versions(self.ctx(), self.state.monorepo_packages(), version)
                .await?;
        } else {
            self.subject.update_version(self.ctx(), version).await?;
        }

        let message = format!("Release {}", self.state.tag()?);
        let files = self
            .tools
            .git
            .commit_and_push(
                self.state.working_root()?,
                self.state.releasing_branch()?,
                &message,
            )
            .await?;

        if files.is_empty() {
            self.tools.output.info("No files changed by the version update");
        } else {
            self.tools.output.info(&format!("Committed \"{message}\":"));
            for file in &files {
                self.tools.output.indent(file);
            }
        }
        self.state.advance(ReleasePhase::VersionBumped);
        Ok(())
    }

    /// Publish the subject unless publishing was turned off
    pub async fn publish(&mut self) -> Result<()> {
        if !self.params.publish {
            self.tools.output.info("Publishing disabled; skipping");
            return Ok(());
        }
        if self.subject.is_monorepo() {
            self.subject
                .monorepo_publish(self.ctx(), self.state.monorepo_packages())
                .await?;
        } else {
            self.subject.publish(self.ctx()).await?;
        }
        self.state.advance(ReleasePhase::Published);
        Ok(())
    }
}
