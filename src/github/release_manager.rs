//! GitHub implementation of [`HostingClient`] on octocrab.

use crate::error::{HostingError, Result};
use crate::git::RepoId;
use crate::github::{HostingClient, HostingConnector, NoteFragment, PullRequestResult};
use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::pulls::PullRequest as GitHubPullRequest;
use octocrab::params::pulls::MergeMethod;
use semver::Version;
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;

/// Public GitHub API endpoint
pub const GITHUB_API: &str = "https://api.github.com";

/// Installs the rustls crypto provider once per process
static RUSTLS_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Configuration for the GitHub client
#[derive(Debug, Clone)]
pub struct GitHubReleaseConfig {
    /// API base URL (GitHub Enterprise uses `https://host/api/v3`)
    pub api_base: String,
    /// Mark releases of pre-1.0 or pre-release versions as prereleases
    pub prerelease_for_zero_versions: bool,
}

impl Default for GitHubReleaseConfig {
    fn default() -> Self {
        Self {
            api_base: GITHUB_API.to_string(),
            prerelease_for_zero_versions: true,
        }
    }
}

/// GitHub client bound to one repository
pub struct GitHubReleaseManager {
    octocrab: Octocrab,
    repo: RepoId,
    config: GitHubReleaseConfig,
}

#[derive(Deserialize)]
struct PrCommit {
    sha: String,
}

impl GitHubReleaseManager {
    /// Create a client for `repo` authenticated with `token`
    pub fn new(token: impl Into<String>, repo: RepoId, config: GitHubReleaseConfig) -> Result<Self> {
        RUSTLS_INITIALIZED.get_or_init(|| {
            // Err only means a provider is already installed
            let _ = rustls::crypto::ring::default_provider().install_default();
        });

        let octocrab = Octocrab::builder()
            .personal_token(token.into())
            .base_uri(config.api_base.as_str())
            .and_then(|builder| builder.build())
            .map_err(|e| github_error(&config.api_base, e))?;

        Ok(Self {
            octocrab,
            repo,
            config,
        })
    }

    fn route(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{}", self.repo.owner, self.repo.name, suffix)
    }
}

/// Map an octocrab failure: API answers keep their status, the rest is transport
fn github_error(endpoint: &str, error: octocrab::Error) -> HostingError {
    match error {
        octocrab::Error::GitHub { source, .. } => HostingError::Api {
            status: source.status_code.as_u16(),
            message: source.message.clone(),
        },
        source => HostingError::Transport {
            endpoint: endpoint.to_string(),
            source,
        },
    }
}

/// Whether a release for `tag` is flagged as a prerelease
fn is_prerelease(tag: &str, config: &GitHubReleaseConfig) -> bool {
    match crate::version::parse_version(tag) {
        Ok(v) if config.prerelease_for_zero_versions => v.major == 0 || !v.pre.is_empty(),
        Ok(v) => !v.pre.is_empty(),
        Err(_) => false,
    }
}

/// `owner/name` into its parts
fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    full_name
        .split_once('/')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
}

/// Map a pull request API response onto [`PullRequestResult`]
fn pull_request_result(raw: serde_json::Value) -> PullRequestResult {
    let str_field = |key: &str| raw.get(key).and_then(|v| v.as_str()).map(String::from);
    let u64_field = |key: &str| raw.get(key).and_then(|v| v.as_u64());

    PullRequestResult {
        state: str_field("state").unwrap_or_else(|| "error".to_string()),
        url: str_field("html_url"),
        api_url: str_field("url"),
        number: u64_field("number"),
        id: u64_field("id"),
        head_repo_full_name: raw
            .pointer("/head/repo/full_name")
            .and_then(|v| v.as_str())
            .map(String::from),
        raw,
    }
}

/// A refused pull request, kept for the operator instead of raised
fn unprocessable(message: &str, errors: Option<&[serde_json::Value]>) -> PullRequestResult {
    PullRequestResult {
        state: "unprocessable".to_string(),
        url: None,
        api_url: None,
        number: None,
        id: None,
        head_repo_full_name: None,
        raw: json!({ "message": message, "errors": errors }),
    }
}

fn note_fragment(pr: GitHubPullRequest) -> NoteFragment {
    NoteFragment {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
        author: pr.user.map(|u| u.login),
    }
}

#[async_trait]
impl HostingClient for GitHubReleaseManager {
    async fn create_release_pull_request(
        &self,
        head: &str,
        base: &str,
        version: &Version,
        previous_version: &Version,
    ) -> Result<PullRequestResult> {
        let created = self
            .octocrab
            .pulls(&self.repo.owner, &self.repo.name)
            .create(format!("Release {version}"), head, base)
            .body(format!("Release {version} (previous release: {previous_version})"))
            .send()
            .await;

        match created {
            Ok(pr) => Ok(pull_request_result(serde_json::to_value(&pr)?)),
            // Validation failures (e.g. a PR already exists) are reported, not raised
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 422 => {
                Ok(unprocessable(&source.message, source.errors.as_deref()))
            }
            Err(e) => Err(github_error(&self.route("/pulls"), e).into()),
        }
    }

    async fn add_label(&self, repo_full_name: &str, number: u64, labels: &[String]) -> Result<()> {
        let (owner, name) = split_full_name(repo_full_name)
            .unwrap_or((self.repo.owner.as_str(), self.repo.name.as_str()));
        self.octocrab
            .issues(owner, name)
            .add_labels(number, labels)
            .await
            .map_err(|e| github_error(&format!("/repos/{owner}/{name}/issues/{number}/labels"), e))?;
        Ok(())
    }

    async fn merge_pull_request(&self, number: u64) -> Result<()> {
        self.octocrab
            .pulls(&self.repo.owner, &self.repo.name)
            .merge(number)
            .method(MergeMethod::Merge)
            .send()
            .await
            .map_err(|e| github_error(&self.route(&format!("/pulls/{number}/merge")), e))?;
        Ok(())
    }

    async fn create_release(&self, tag: &str, notes: &str) -> Result<String> {
        let release = self
            .octocrab
            .repos(&self.repo.owner, &self.repo.name)
            .releases()
            .create(tag)
            .name(tag)
            .body(notes)
            .draft(false)
            .prerelease(is_prerelease(tag, &self.config))
            .send()
            .await
            .map_err(|e| github_error(&self.route("/releases"), e))?;
        Ok(release.html_url.to_string())
    }

    async fn verify_repository_access(&self) -> Result<bool> {
        match self.octocrab.repos(&self.repo.owner, &self.repo.name).get().await {
            Ok(repo) => Ok(repo.permissions.map(|p| p.push).unwrap_or(false)),
            Err(octocrab::Error::GitHub { source, .. })
                if matches!(source.status_code.as_u16(), 401 | 403 | 404) =>
            {
                log::debug!("Repository access refused: {}", source.message);
                Ok(false)
            }
            Err(e) => Err(github_error(&self.route(""), e).into()),
        }
    }

    async fn get_commit_shas_for_pull_request(&self, number: u64) -> Result<Vec<String>> {
        let route = self.route(&format!("/pulls/{number}/commits"));
        let commits: Vec<PrCommit> = self
            .octocrab
            .get(&route, Some(&[("per_page", "100")]))
            .await
            .map_err(|e| github_error(&route, e))?;
        Ok(commits.into_iter().map(|c| c.sha).collect())
    }

    async fn merged_pull_requests_for_commit(&self, sha: &str) -> Result<Vec<NoteFragment>> {
        let route = self.route(&format!("/commits/{sha}/pulls"));
        let pulls: Vec<GitHubPullRequest> = self
            .octocrab
            .get(&route, None::<&()>)
            .await
            .map_err(|e| github_error(&route, e))?;
        Ok(pulls
            .into_iter()
            .filter(|pr| pr.merged_at.is_some())
            .map(note_fragment)
            .collect())
    }

    fn repository(&self) -> &RepoId {
        &self.repo
    }
}

/// Connector producing [`GitHubReleaseManager`] instances
#[derive(Debug, Clone, Default)]
pub struct GitHubConnector {
    config: GitHubReleaseConfig,
}

impl GitHubConnector {
    /// Connector using `config` for every client
    pub fn new(config: GitHubReleaseConfig) -> Self {
        Self { config }
    }
}

impl HostingConnector for GitHubConnector {
    fn connect(&self, token: &str, repo: &RepoId) -> Result<Box<dyn HostingClient>> {
        Ok(Box::new(GitHubReleaseManager::new(
            token,
            repo.clone(),
            self.config.clone(),
        )?))
    }
}
