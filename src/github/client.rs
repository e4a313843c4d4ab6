//! Hosting platform capability consumed by the release orchestrator.

use crate::error::Result;
use crate::git::RepoId;
use crate::github::notes::format_release_notes;
use async_trait::async_trait;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// State reported for a freshly opened pull request
pub const PR_STATE_OPEN: &str = "open";

/// Outcome of asking the platform to open the release pull request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestResult {
    /// `open` on success; anything else is a failure
    pub state: String,
    /// Browser URL
    pub url: Option<String>,
    /// API URL
    pub api_url: Option<String>,
    /// Pull request number
    pub number: Option<u64>,
    /// Platform id
    pub id: Option<u64>,
    /// `owner/name` of the head repository
    pub head_repo_full_name: Option<String>,
    /// Raw platform response, shown to the operator on failure
    pub raw: serde_json::Value,
}

impl PullRequestResult {
    /// Whether the pull request was opened
    pub fn is_open(&self) -> bool {
        self.state == PR_STATE_OPEN
    }
}

/// A merged pull request contributing to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFragment {
    /// Pull request number
    pub number: u64,
    /// Pull request title
    pub title: String,
    /// Browser URL
    pub url: String,
    /// Author login
    pub author: Option<String>,
}

/// Hosting operations needed for a release
#[async_trait]
pub trait HostingClient: Send + Sync {
    /// Open a pull request from `head` into `base` for `version`
    async fn create_release_pull_request(
        &self,
        head: &str,
        base: &str,
        version: &Version,
        previous_version: &Version,
    ) -> Result<PullRequestResult>;

    /// Attach `labels` to the issue/pull request `number` of `repo_full_name`
    async fn add_label(&self, repo_full_name: &str, number: u64, labels: &[String]) -> Result<()>;

    /// Merge pull request `number`
    async fn merge_pull_request(&self, number: u64) -> Result<()>;

    /// Publish a release for `tag`; returns its URL
    async fn create_release(&self, tag: &str, notes: &str) -> Result<String>;

    /// Whether the token can push to the repository
    async fn verify_repository_access(&self) -> Result<bool>;

    /// Commit SHAs contained in pull request `number`
    async fn get_commit_shas_for_pull_request(&self, number: u64) -> Result<Vec<String>>;

    /// Merged pull requests that contain commit `sha`
    async fn merged_pull_requests_for_commit(&self, sha: &str) -> Result<Vec<NoteFragment>>;

    /// Repository this client is bound to
    fn repository(&self) -> &RepoId;

    /// Release notes for the release pull request `number`.
    ///
    /// Every commit of the release PR is looked up to find the merged pull
    /// request that introduced it; the release PR itself is skipped.
    async fn extract_release_notes_from_release_pr(&self, number: u64) -> Result<String> {
        let shas = self.get_commit_shas_for_pull_request(number).await?;

        let mut seen = BTreeSet::new();
        let mut fragments = Vec::new();
        for sha in shas {
            for fragment in self.merged_pull_requests_for_commit(&sha).await? {
                if fragment.number != number && seen.insert(fragment.number) {
                    fragments.push(fragment);
                }
            }
        }

        Ok(format_release_notes(&fragments))
    }
}

/// Builds a [`HostingClient`] once the token and repository are known
pub trait HostingConnector: Send + Sync {
    /// Connect to `repo` with `token`
    fn connect(&self, token: &str, repo: &RepoId) -> Result<Box<dyn HostingClient>>;
}
