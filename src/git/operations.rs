//! Source control capability consumed by the release orchestrator.
//!
//! Every operation receives the working root explicitly instead of relying on
//! the process working directory. Merges report conflicts as
//! [`GitError::Conflict`](crate::error::GitError::Conflict), whose message
//! starts with `CONFLICTS:`.

use crate::error::Result;
use crate::git::RepoId;
use async_trait::async_trait;
use std::path::Path;

/// One commit as read from the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    /// Full SHA
    pub sha: String,
    /// First line
    pub subject: String,
    /// Remaining lines
    pub body: String,
}

/// Version-control operations needed for a release
#[async_trait]
pub trait SourceControlClient: Send + Sync {
    /// Fail unless `root` is inside a git work tree
    async fn verify_repository(&self, root: &Path) -> Result<()>;

    /// Local branch names plus remote-tracking names (`origin/main`)
    async fn list_branches(&self, root: &Path) -> Result<Vec<String>>;

    /// Whether `name` exists locally or on the configured remote
    async fn has_branch(&self, root: &Path, name: &str) -> Result<bool>;

    /// Create `name` from the current HEAD and check it out
    async fn create_local_branch(&self, root: &Path, name: &str) -> Result<()>;

    /// Delete `name` locally and on the remote when present
    async fn delete_branch(&self, root: &Path, name: &str) -> Result<()>;

    /// Whether the work tree has uncommitted or untracked changes
    async fn has_local_changes(&self, root: &Path) -> Result<bool>;

    /// Whether a signing key is configured for tags
    async fn has_signing_key_configured(&self, root: &Path) -> Result<bool>;

    /// Check out `branch` and pull it from the remote
    async fn pull(&self, root: &Path, branch: &str) -> Result<()>;

    /// Push `branch` to the remote
    async fn push(&self, root: &Path, branch: &str) -> Result<()>;

    /// Whether tag `name` exists
    async fn has_tag(&self, root: &Path, name: &str) -> Result<bool>;

    /// Create tag `name` on `branch` with `comment` and push it
    async fn create_and_push_tag(
        &self,
        root: &Path,
        branch: &str,
        name: &str,
        comment: &str,
        sign: bool,
    ) -> Result<()>;

    /// Files changed between two revisions
    async fn diff_between(&self, root: &Path, from: &str, to: &str) -> Result<Vec<String>>;

    /// Merge `feature` into `base` with a merge commit (not pushed)
    async fn merge_as_pull_request(&self, root: &Path, base: &str, feature: &str) -> Result<()>;

    /// Merge the released branch back into `base` (not pushed)
    async fn merge_back(&self, root: &Path, base: &str, released: &str) -> Result<()>;

    /// Abort an in-progress merge
    async fn abort_merge(&self, root: &Path) -> Result<()>;

    /// Stage everything, commit and push `branch`; returns the committed files
    async fn commit_and_push(&self, root: &Path, branch: &str, message: &str) -> Result<Vec<String>>;

    /// `owner/name` derived from the remote URL
    async fn get_repository_identifier(&self, root: &Path) -> Result<RepoId>;

    /// Most recent tag reachable from HEAD
    async fn get_last_tag(&self, root: &Path) -> Result<Option<String>>;

    /// Non-merge commits after `since_tag`, optionally limited to `subpath`
    async fn commit_messages(
        &self,
        root: &Path,
        since_tag: Option<&str>,
        subpath: Option<&Path>,
    ) -> Result<Vec<CommitMessage>>;

    /// Drop remote-tracking refs that no longer exist on the remote
    async fn prune_remote(&self, root: &Path) -> Result<()>;
}
