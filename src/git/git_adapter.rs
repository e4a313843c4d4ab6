//! `SourceControlClient` backed by the system `git` executable.

use crate::error::{CONFLICT_PREFIX, GitError, Result};
use crate::git::{CommitMessage, RepoId, SourceControlClient};
use crate::process::{self, CommandOutput};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

/// `git describe` stderr when no tag is reachable from HEAD
const NO_TAG_MARKERS: &[&str] = &["No names found", "No tags can describe"];

/// Git operations through the `git` command line
#[derive(Debug, Clone)]
pub struct GitCli {
    git: PathBuf,
    remote: String,
}

impl GitCli {
    /// Locate `git` in PATH and bind to `remote`
    pub fn new(remote: impl Into<String>) -> Result<Self> {
        let git = which::which("git").map_err(|_| GitError::GitNotFound)?;
        Ok(Self {
            git,
            remote: remote.into(),
        })
    }

    /// Remote this client pushes to and pulls from
    pub fn remote(&self) -> &str {
        &self.remote
    }

    async fn exec(&self, root: &Path, args: &[&str]) -> Result<CommandOutput> {
        Ok(process::run(&self.git, args, root).await?)
    }

    /// Run git and fail on a non-zero exit
    async fn checked(&self, root: &Path, args: &[&str]) -> Result<CommandOutput> {
        let output = self.exec(root, args).await?;
        if !output.success {
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                reason: output.failure_reason(),
            }
            .into());
        }
        Ok(output)
    }

    async fn checkout(&self, root: &Path, branch: &str) -> Result<()> {
        self.checked(root, &["checkout", branch]).await.map(|_| ())
    }

    async fn remote_branch_exists(&self, root: &Path, name: &str) -> Result<bool> {
        let output = self
            .exec(root, &["ls-remote", "--exit-code", "--heads", &self.remote, name])
            .await?;
        // ls-remote --exit-code returns 2 when nothing matched
        match output.code {
            Some(0) => Ok(true),
            Some(2) => Ok(false),
            _ => Err(GitError::CommandFailed {
                command: format!("ls-remote --heads {} {}", self.remote, name),
                reason: output.failure_reason(),
            }
            .into()),
        }
    }

    /// Merge `source` into the checked-out branch, surfacing conflicts
    async fn merge_into_current(&self, root: &Path, source: &str, message: &str) -> Result<()> {
        let output = self
            .exec(root, &["merge", "--no-ff", "-m", message, source])
            .await?;
        if output.success {
            return Ok(());
        }

        let unmerged = self
            .checked(root, &["diff", "--name-only", "--diff-filter=U"])
            .await?
            .stdout_lines();
        if unmerged.is_empty() {
            return Err(GitError::CommandFailed {
                command: format!("merge {source}"),
                reason: output.failure_reason(),
            }
            .into());
        }

        Err(GitError::Conflict {
            message: format!("{} {}", CONFLICT_PREFIX, unmerged.join(", ")),
        }
        .into())
    }
}

#[async_trait]
impl SourceControlClient for GitCli {
    async fn verify_repository(&self, root: &Path) -> Result<()> {
        let output = self.exec(root, &["rev-parse", "--is-inside-work-tree"]).await?;
        if output.success && output.stdout_trimmed() == "true" {
            Ok(())
        } else {
            Err(GitError::NotRepository {
                path: root.to_path_buf(),
            }
            .into())
        }
    }

    async fn list_branches(&self, root: &Path) -> Result<Vec<String>> {
        let output = self
            .checked(
                root,
                &["branch", "--all", "--format=%(refname:short)"],
            )
            .await?;
        Ok(output.stdout_lines())
    }

    async fn has_branch(&self, root: &Path, name: &str) -> Result<bool> {
        let remote_name = format!("{}/{}", self.remote, name);
        let branches = self.list_branches(root).await?;
        if branches.iter().any(|b| b == name || *b == remote_name) {
            return Ok(true);
        }
        self.remote_branch_exists(root, name).await
    }

    async fn create_local_branch(&self, root: &Path, name: &str) -> Result<()> {
        self.checked(root, &["checkout", "-b", name]).await.map(|_| ())
    }

    async fn delete_branch(&self, root: &Path, name: &str) -> Result<()> {
        let branches = self.list_branches(root).await?;
        if branches.iter().any(|b| b == name) {
            self.checked(root, &["branch", "-D", name]).await?;
        }
        if self.remote_branch_exists(root, name).await? {
            self.checked(root, &["push", &self.remote, "--delete", name]).await?;
        }
        Ok(())
    }

    async fn has_local_changes(&self, root: &Path) -> Result<bool> {
        let output = self.checked(root, &["status", "--porcelain"]).await?;
        Ok(!output.stdout_trimmed().is_empty())
    }

    async fn has_signing_key_configured(&self, root: &Path) -> Result<bool> {
        let output = self.exec(root, &["config", "--get", "user.signingkey"]).await?;
        Ok(output.success && !output.stdout_trimmed().is_empty())
    }

    async fn pull(&self, root: &Path, branch: &str) -> Result<()> {
        self.checkout(root, branch).await?;
        self.checked(root, &["pull", &self.remote, branch]).await.map(|_| ())
    }

    async fn push(&self, root: &Path, branch: &str) -> Result<()> {
        self.checked(root, &["push", "--set-upstream", &self.remote, branch])
            .await
            .map(|_| ())
    }

    async fn has_tag(&self, root: &Path, name: &str) -> Result<bool> {
        self.checked(root, &["fetch", &self.remote, "--tags"]).await?;
        let output = self.checked(root, &["tag", "--list", name]).await?;
        Ok(output.stdout_lines().iter().any(|t| t == name))
    }

    async fn create_and_push_tag(
        &self,
        root: &Path,
        branch: &str,
        name: &str,
        comment: &str,
        sign: bool,
    ) -> Result<()> {
        self.checkout(root, branch).await?;
        let mode = if sign { "-s" } else { "-a" };
        self.checked(root, &["tag", mode, name, "-m", comment]).await?;
        self.checked(root, &["push", &self.remote, name]).await.map(|_| ())
    }

    async fn diff_between(&self, root: &Path, from: &str, to: &str) -> Result<Vec<String>> {
        let range = format!("{from}..{to}");
        let output = self.checked(root, &["diff", "--name-only", &range]).await?;
        Ok(output.stdout_lines())
    }

    async fn merge_as_pull_request(&self, root: &Path, base: &str, feature: &str) -> Result<()> {
        self.pull(root, base).await?;
        self.merge_into_current(root, feature, &format!("Merge branch '{feature}'"))
            .await
    }

    async fn merge_back(&self, root: &Path, base: &str, released: &str) -> Result<()> {
        self.pull(root, base).await?;
        self.merge_into_current(
            root,
            released,
            &format!("Merge branch '{released}' into {base}"),
        )
        .await
    }

    async fn abort_merge(&self, root: &Path) -> Result<()> {
        self.checked(root, &["merge", "--abort"]).await.map(|_| ())
    }

    async fn commit_and_push(&self, root: &Path, branch: &str, message: &str) -> Result<Vec<String>> {
        self.checked(root, &["add", "--all"]).await?;
        let staged = self
            .checked(root, &["diff", "--cached", "--name-only"])
            .await?
            .stdout_lines();
        if !staged.is_empty() {
            self.checked(root, &["commit", "-m", message]).await?;
        }
        // The branch must exist on the remote even without a commit of its own
        self.push(root, branch).await?;
        Ok(staged)
    }

    async fn get_repository_identifier(&self, root: &Path) -> Result<RepoId> {
        let output = self.checked(root, &["remote", "get-url", &self.remote]).await?;
        RepoId::parse(output.stdout_trimmed())
    }

    async fn get_last_tag(&self, root: &Path) -> Result<Option<String>> {
        let output = self.exec(root, &["describe", "--tags", "--abbrev=0"]).await?;
        if output.success {
            return Ok(Some(output.stdout_trimmed().to_string()));
        }
        if NO_TAG_MARKERS.iter().any(|m| output.stderr.contains(m)) {
            return Ok(None);
        }
        Err(GitError::CommandFailed {
            command: "describe --tags --abbrev=0".to_string(),
            reason: output.failure_reason(),
        }
        .into())
    }

    async fn commit_messages(
        &self,
        root: &Path,
        since_tag: Option<&str>,
        subpath: Option<&Path>,
    ) -> Result<Vec<CommitMessage>> {
        let format = format!("--format=%H{FIELD_SEP}%s{FIELD_SEP}%b{RECORD_SEP}");
        let range = since_tag.map(|t| format!("{t}..HEAD"));
        let subpath_str = subpath.map(|p| p.to_string_lossy().to_string());

        let mut args = vec!["log", "--no-merges", format.as_str()];
        if let Some(range) = &range {
            args.push(range);
        }
        if let Some(path) = &subpath_str {
            args.push("--");
            args.push(path);
        }

        let output = self.checked(root, &args).await?;
        Ok(parse_log(&output.stdout))
    }

    async fn prune_remote(&self, root: &Path) -> Result<()> {
        self.checked(root, &["remote", "prune", &self.remote]).await.map(|_| ())
    }
}

/// Split `git log` output produced with the record/field separators
fn parse_log(raw: &str) -> Vec<CommitMessage> {
    raw.split(RECORD_SEP)
        .filter_map(|record| {
            let record = record.trim_start_matches('\n');
            if record.trim().is_empty() {
                return None;
            }
            let mut fields = record.splitn(3, FIELD_SEP);
            let sha = fields.next()?.trim().to_string();
            let subject = fields.next().unwrap_or_default().trim().to_string();
            let body = fields.next().unwrap_or_default().trim().to_string();
            Some(CommitMessage { sha, subject, body })
        })
        .collect()
}
