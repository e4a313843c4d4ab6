//! GitHub steps: credentials, the release pull request and the release itself.

use crate::error::{ReleaseError, Result, StateError, TerminationKind};
use crate::github::PullRequestResult;
use crate::orchestrator::{BROWSER_DELAY, PR_TROUBLESHOOTING_URL, RELEASE_LABEL, ReleaseOrchestrator};
use crate::state::{PullRequest, ReleasePhase};

fn pull_request_failed(result: &PullRequestResult, problem: &str) -> ReleaseError {
    let raw = serde_json::to_string_pretty(&result.raw).unwrap_or_else(|_| result.raw.to_string());
    ReleaseError::terminate(
        TerminationKind::PullRequestFailed,
        format!(
            "The release pull request could not be opened ({problem}, state '{}').\nResponse:\n{raw}\nSee {PR_TROUBLESHOOTING_URL}",
            result.state
        ),
    )
}

impl ReleaseOrchestrator {
    /// Resolve a token and connect to the subject's repository
    pub async fn initialise_github_client(&mut self) -> Result<()> {
        let token = match self.state.token() {
            Some(token) => token.to_string(),
            None => self.resolve_token().await?,
        };

        if self.params.write_config {
            let store = &self.tools.config_store;
            let mut config = store.load()?;
            if config.token.as_deref() != Some(token.as_str()) {
                config.token = Some(token.clone());
                store.save(&config)?;
                log::info!("Saved GitHub token to the user config");
            }
        }

        let repo = self.state.metadata()?.repo_name.clone();
        self.hosting_client = Some(self.tools.hosting.connect(&token, &repo)?);
        self.state.set_token(token);
        log::info!("Connected to GitHub repository {repo}");
        Ok(())
    }

    /// Token from the user config, then the environment, then the operator
    async fn resolve_token(&self) -> Result<String> {
        if let Some(token) = self.tools.config_store.load()?.token.filter(|t| !t.trim().is_empty()) {
            log::debug!("Using GitHub token from the user config");
            return Ok(token);
        }
        if let Some(token) = self.tools.env.github_token() {
            log::debug!("Using GitHub token from the environment");
            return Ok(token.to_string());
        }
        if !self.params.interactive {
            return Err(ReleaseError::terminate(
                TerminationKind::Validation,
                "No GitHub token found; set GH_TOKEN or GITHUB_TOKEN",
            ));
        }
        let token = self
            .tools
            .prompter
            .password("GitHub token (repo scope)")
            .await?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ReleaseError::terminate(
                TerminationKind::Validation,
                "A GitHub token is required",
            ));
        }
        Ok(token.to_string())
    }

    /// The token must be able to push to the repository
    pub async fn verify_credentials(&mut self) -> Result<()> {
        if !self.hosting()?.verify_repository_access().await? {
            return Err(ReleaseError::terminate(
                TerminationKind::InvalidCredentials,
                format!(
                    "The GitHub token cannot push to {}",
                    self.state.metadata()?.repo_name
                ),
            ));
        }
        self.tools.output.success("GitHub credentials verified");
        self.state.advance(ReleasePhase::CredentialsVerified);
        Ok(())
    }

    /// Open the release pull request and label it
    pub async fn create_pull_request(&mut self) -> Result<()> {
        let result = self
            .hosting()?
            .create_release_pull_request(
                self.state.releasing_branch()?,
                &self.params.release_branch,
                self.state.version()?,
                self.state.last_version()?,
            )
            .await?;

        if !result.is_open() {
            return Err(pull_request_failed(&result, "unexpected state"));
        }
        let (Some(url), Some(number)) = (result.url.clone(), result.number) else {
            return Err(pull_request_failed(&result, "response has no URL or number"));
        };

        let full_name = result
            .head_repo_full_name
            .clone()
            .unwrap_or_else(|| self.state.metadata().map(|m| m.repo_name.full_name()).unwrap_or_default());
        self.state.set_pull_request(PullRequest {
            url: url.clone(),
            api_url: result.api_url.clone().unwrap_or_default(),
            number,
            id: result.id,
            full_name: full_name.clone(),
            notes: None,
        })?;

        self.hosting()?
            .add_label(&full_name, number, &[RELEASE_LABEL.to_string()])
            .await?;
        self.tools
            .output
            .success(&format!("Opened pull request #{number}: {url}"));
        self.state.advance(ReleasePhase::PRCreated);
        Ok(())
    }

    /// Collect notes from the pull requests merged since the last release
    pub async fn extract_release_notes(&mut self) -> Result<()> {
        let Some(number) = self.state.pull_request().map(|pr| pr.number) else {
            log::warn!("No release pull request; skipping release notes");
            self.tools
                .output
                .warn("No release pull request; release notes will fall back to the comment");
            return Ok(());
        };
        let notes = match self
            .hosting()?
            .extract_release_notes_from_release_pr(number)
            .await
        {
            Ok(notes) => notes,
            // Notes are optional once the pull request is open
            Err(ReleaseError::Hosting(e)) => {
                log::warn!("Release notes for #{number} unavailable: {e}");
                self.tools.output.warn(&format!(
                    "Could not collect release notes ({e}); the release will use the comment"
                ));
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        self.state.set_release_notes(notes)?;
        self.state.advance(ReleasePhase::NotesExtracted);
        Ok(())
    }

    /// Merge the approved release pull request and update the local release branch
    pub async fn merge_pull_request(&mut self) -> Result<()> {
        let pr = self
            .state
            .pull_request()
            .cloned()
            .ok_or(StateError::Missing {
                field: "pull_request",
            })?;

        if self.params.interactive {
            self.tools.prompter.open_browser_after(&pr.url, BROWSER_DELAY);
            let question = format!("Has pull request #{} been approved?", pr.number);
            if !self.tools.prompter.confirm(&question, false).await? {
                return Err(ReleaseError::terminate(
                    TerminationKind::UserDeclined,
                    format!("Pull request #{} is not approved yet: {}", pr.number, pr.url),
                ));
            }
        }

        self.hosting()?.merge_pull_request(pr.number).await?;
        self.tools
            .git
            .pull(self.state.working_root()?, &self.params.release_branch)
            .await?;
        self.tools
            .output
            .success(&format!("Merged pull request #{}", pr.number));
        self.state.advance(ReleasePhase::PRMerged);
        Ok(())
    }

    /// Publish the GitHub release for the tag
    pub async fn create_github_release(&mut self) -> Result<()> {
        let tag = self.state.tag()?;
        let notes = self
            .state
            .pull_request()
            .and_then(|pr| pr.notes.clone())
            .or_else(|| self.params.comment.clone())
            .unwrap_or_else(|| format!("Release {tag}"));
        let url = self.hosting()?.create_release(tag, &notes).await?;
        self.tools
            .output
            .success(&format!("Created GitHub release {tag}: {url}"));
        self.state.advance(ReleasePhase::Released);
        Ok(())
    }
}
