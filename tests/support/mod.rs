//! In-memory collaborators for driving the orchestrator in tests.
#![allow(dead_code)]

use async_trait::async_trait;
use kodegen_release_flow::cli::OutputManager;
use kodegen_release_flow::config::{EnvConfig, UserConfig, UserConfigStore};
use kodegen_release_flow::error::{CONFLICT_PREFIX, GitError, HostingError, PackageError, Result};
use kodegen_release_flow::git::{CommitMessage, RepoId, SourceControlClient};
use kodegen_release_flow::github::{HostingClient, HostingConnector, NoteFragment, PullRequestResult};
use kodegen_release_flow::package::{MonorepoMember, PackageDescriptor, PackageManager};
use kodegen_release_flow::prompt::Prompter;
use kodegen_release_flow::version::{CommitStats, NextVersion, Recommendation, VersionRecommender, increment_version};
use kodegen_release_flow::Toolbox;
use semver::Version;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------- git

/// Canned answers for [`FakeGit`]
#[derive(Debug, Clone, Default)]
pub struct GitScript {
    pub last_tag: Option<String>,
    pub branches: Vec<String>,
    pub tags: Vec<String>,
    pub diff: Vec<String>,
    pub dirty: bool,
    pub signing_key: bool,
    pub merge_conflict: bool,
    pub merge_failure: Option<String>,
    pub committed_files: Vec<String>,
}

/// Branches that exist on the fake remote, shared with the hosting fake
pub type RemoteHeads = Arc<Mutex<HashSet<String>>>;

pub struct FakeGit {
    pub script: Mutex<GitScript>,
    pub remote: RemoteHeads,
    calls: Mutex<Vec<String>>,
}

impl FakeGit {
    pub fn new(script: GitScript) -> Arc<Self> {
        let remote = script.branches.iter().cloned().collect();
        Arc::new(Self {
            script: Mutex::new(script),
            remote: Arc::new(Mutex::new(remote)),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn on_remote(&self, branch: &str) -> bool {
        self.remote.lock().unwrap().contains(branch)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn script(&self) -> GitScript {
        self.script.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn merge(&self, call: String) -> Result<()> {
        self.record(call);
        let script = self.script();
        if script.merge_conflict {
            return Err(GitError::Conflict {
                message: format!("{CONFLICT_PREFIX} CHANGELOG.md, package.json"),
            }
            .into());
        }
        if let Some(reason) = script.merge_failure {
            return Err(GitError::CommandFailed {
                command: "merge".to_string(),
                reason,
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl SourceControlClient for FakeGit {
    async fn verify_repository(&self, _root: &Path) -> Result<()> {
        self.record("verify".to_string());
        Ok(())
    }

    async fn list_branches(&self, _root: &Path) -> Result<Vec<String>> {
        Ok(self.script().branches)
    }

    async fn has_branch(&self, _root: &Path, name: &str) -> Result<bool> {
        Ok(self.script().branches.iter().any(|b| b == name))
    }

    async fn create_local_branch(&self, _root: &Path, name: &str) -> Result<()> {
        self.record(format!("create_branch {name}"));
        Ok(())
    }

    async fn delete_branch(&self, _root: &Path, name: &str) -> Result<()> {
        self.record(format!("delete_branch {name}"));
        self.remote.lock().unwrap().remove(name);
        Ok(())
    }

    async fn has_local_changes(&self, _root: &Path) -> Result<bool> {
        self.record("status".to_string());
        Ok(self.script().dirty)
    }

    async fn has_signing_key_configured(&self, _root: &Path) -> Result<bool> {
        Ok(self.script().signing_key)
    }

    async fn pull(&self, _root: &Path, branch: &str) -> Result<()> {
        self.record(format!("pull {branch}"));
        Ok(())
    }

    async fn push(&self, _root: &Path, branch: &str) -> Result<()> {
        self.record(format!("push {branch}"));
        self.remote.lock().unwrap().insert(branch.to_string());
        Ok(())
    }

    async fn has_tag(&self, _root: &Path, name: &str) -> Result<bool> {
        Ok(self.script().tags.iter().any(|t| t == name))
    }

    async fn create_and_push_tag(&self, _root: &Path, branch: &str, name: &str, comment: &str, sign: bool) -> Result<()> {
        self.record(format!("tag {name} on {branch} signed={sign} \"{comment}\""));
        Ok(())
    }

    async fn diff_between(&self, _root: &Path, from: &str, to: &str) -> Result<Vec<String>> {
        self.record(format!("diff {from}..{to}"));
        Ok(self.script().diff)
    }

    async fn merge_as_pull_request(&self, _root: &Path, base: &str, feature: &str) -> Result<()> {
        self.merge(format!("merge {feature} into {base}"))
    }

    async fn merge_back(&self, _root: &Path, base: &str, released: &str) -> Result<()> {
        self.merge(format!("merge_back {released} into {base}"))
    }

    async fn abort_merge(&self, _root: &Path) -> Result<()> {
        self.record("abort_merge".to_string());
        Ok(())
    }

    async fn commit_and_push(&self, _root: &Path, branch: &str, message: &str) -> Result<Vec<String>> {
        self.record(format!("commit {branch} \"{message}\""));
        // Pushed whether or not anything was committed
        self.remote.lock().unwrap().insert(branch.to_string());
        Ok(self.script().committed_files)
    }

    async fn get_repository_identifier(&self, _root: &Path) -> Result<RepoId> {
        Ok(RepoId::new("acme", "widget"))
    }

    async fn get_last_tag(&self, _root: &Path) -> Result<Option<String>> {
        Ok(self.script().last_tag)
    }

    async fn commit_messages(&self, _root: &Path, _since_tag: Option<&str>, _subpath: Option<&Path>) -> Result<Vec<CommitMessage>> {
        Ok(Vec::new())
    }

    async fn prune_remote(&self, _root: &Path) -> Result<()> {
        self.record("prune".to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------- recommender

/// `root` answers whole-repository queries; unknown subpaths have no commits
#[derive(Default)]
pub struct FakeRecommender {
    pub root: CommitStats,
    pub by_path: HashMap<PathBuf, CommitStats>,
    calls: Mutex<usize>,
}

impl FakeRecommender {
    pub fn with_stats(root: CommitStats) -> Arc<Self> {
        Arc::new(Self {
            root,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

pub fn stats(features: usize, fix: usize, unset: usize) -> CommitStats {
    CommitStats {
        commits: features + fix + unset,
        unset,
        features,
        fix,
        breakings: 0,
    }
}

#[async_trait]
impl VersionRecommender for FakeRecommender {
    async fn get_next_version(
        &self,
        _root: &Path,
        last_version: &Version,
        _last_tag: Option<&str>,
        subpath: Option<&Path>,
    ) -> Result<NextVersion> {
        *self.calls.lock().unwrap() += 1;
        let stats = match subpath {
            Some(path) => self.by_path.get(path).copied().unwrap_or_default(),
            None => self.root,
        };
        let release_type = stats.release_type();
        Ok(NextVersion {
            version: increment_version(last_version, release_type),
            recommendation: Recommendation {
                release_type,
                reason: stats.reason(),
                stats,
            },
        })
    }
}

// ---------------------------------------------------------------- package manager

/// Runs no processes; descriptors are read from and written to disk
#[derive(Default)]
pub struct FakePackageManager {
    pub members: Vec<MonorepoMember>,
    pub failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakePackageManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_members(members: Vec<MonorepoMember>) -> Arc<Self> {
        Arc::new(Self {
            members,
            ..Default::default()
        })
    }

    pub fn failing(tasks: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: tasks.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn run(&self, call: &str) -> Result<()> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.failing.contains(call) {
            return Err(PackageError::CommandFailed {
                command: call.to_string(),
                reason: "exit status 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl PackageManager for FakePackageManager {
    async fn install(&self, _root: &Path) -> Result<()> {
        self.run("install")
    }

    async fn run_script(&self, _root: &Path, script: &str) -> Result<()> {
        self.run(&format!("run {script}"))
    }

    async fn publish(&self, root: &Path, registry: Option<&str>) -> Result<()> {
        let dir = root.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        self.run(&format!("publish {dir} {}", registry.unwrap_or("default")))
    }

    async fn read_descriptor(&self, root: &Path) -> Result<PackageDescriptor> {
        let path = root.join("package.json");
        let content = std::fs::read_to_string(&path)?;
        PackageDescriptor::parse(path, &content)
    }

    async fn write_descriptor(&self, descriptor: &PackageDescriptor) -> Result<()> {
        std::fs::write(descriptor.path(), descriptor.to_pretty_string()?)?;
        Ok(())
    }

    async fn update_version(&self, _root: &Path, version: &Version) -> Result<()> {
        self.run(&format!("version {version}"))
    }

    async fn refresh_lock_file(&self, _root: &Path) -> Result<()> {
        self.run("lock")
    }

    async fn list_monorepo_members(&self, _root: &Path) -> Result<Vec<MonorepoMember>> {
        Ok(self.members.clone())
    }
}

// ---------------------------------------------------------------- prompter

#[derive(Default)]
pub struct FakePrompter {
    answers: Mutex<VecDeque<bool>>,
    questions: Mutex<Vec<String>>,
    pub password: Option<String>,
    pub selection: usize,
    browser: Mutex<Vec<(String, Duration)>>,
}

impl FakePrompter {
    /// Prompter answering confirmations with `answers`, in order
    pub fn answering(answers: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            ..Default::default()
        })
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    pub fn browser_opens(&self) -> Vec<(String, Duration)> {
        self.browser.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompter for FakePrompter {
    async fn confirm(&self, message: &str, _default: bool) -> Result<bool> {
        self.questions.lock().unwrap().push(message.to_string());
        let answer = self.answers.lock().unwrap().pop_front();
        Ok(answer.unwrap_or_else(|| panic!("unexpected confirmation: {message}")))
    }

    async fn select(&self, message: &str, _items: &[String]) -> Result<usize> {
        self.questions.lock().unwrap().push(message.to_string());
        Ok(self.selection)
    }

    async fn password(&self, message: &str) -> Result<String> {
        self.questions.lock().unwrap().push(message.to_string());
        Ok(self.password.clone().unwrap_or_else(|| panic!("unexpected password prompt")))
    }

    fn open_browser_after(&self, url: &str, delay: Duration) {
        self.browser.lock().unwrap().push((url.to_string(), delay));
    }
}

// ---------------------------------------------------------------- hosting

#[derive(Debug, Clone)]
pub struct HostingLog {
    pub pr_state: String,
    pub access: bool,
    pub tokens: Vec<String>,
    pub labels: Vec<(String, u64, Vec<String>)>,
    pub merged: Vec<u64>,
    pub releases: Vec<(String, String)>,
    /// Status returned by every commit lookup, e.g. 403 when rate limited
    pub notes_failure: Option<u16>,
    pub commit_lookups: usize,
}

impl Default for HostingLog {
    fn default() -> Self {
        Self {
            pr_state: "open".to_string(),
            access: true,
            tokens: Vec::new(),
            labels: Vec::new(),
            merged: Vec::new(),
            releases: Vec::new(),
            notes_failure: None,
            commit_lookups: 0,
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    pub log: Arc<Mutex<HostingLog>>,
    remote: RemoteHeads,
}

impl FakeConnector {
    pub fn with_remote(remote: RemoteHeads) -> Self {
        Self {
            log: Arc::default(),
            remote,
        }
    }

    pub fn log(&self) -> HostingLog {
        self.log.lock().unwrap().clone()
    }
}

impl HostingConnector for FakeConnector {
    fn connect(&self, token: &str, repo: &RepoId) -> Result<Box<dyn HostingClient>> {
        self.log.lock().unwrap().tokens.push(token.to_string());
        Ok(Box::new(FakeHostingClient {
            log: self.log.clone(),
            remote: self.remote.clone(),
            repo: repo.clone(),
        }))
    }
}

pub struct FakeHostingClient {
    log: Arc<Mutex<HostingLog>>,
    remote: RemoteHeads,
    repo: RepoId,
}

#[async_trait]
impl HostingClient for FakeHostingClient {
    async fn create_release_pull_request(
        &self,
        head: &str,
        base: &str,
        _version: &Version,
        _previous_version: &Version,
    ) -> Result<PullRequestResult> {
        if !self.remote.lock().unwrap().contains(head) {
            return Err(HostingError::Api {
                status: 422,
                message: format!("Validation Failed: head {head} does not exist"),
            }
            .into());
        }
        let state = self.log.lock().unwrap().pr_state.clone();
        let open = state == "open";
        Ok(PullRequestResult {
            state,
            url: open.then(|| "https://github.com/acme/widget/pull/7".to_string()),
            api_url: open.then(|| "https://api.github.com/repos/acme/widget/pulls/7".to_string()),
            number: open.then_some(7),
            id: open.then_some(70),
            head_repo_full_name: open.then(|| self.repo.full_name()),
            raw: serde_json::json!({ "head": head, "base": base, "message": "Validation Failed" }),
        })
    }

    async fn add_label(&self, repo_full_name: &str, number: u64, labels: &[String]) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .labels
            .push((repo_full_name.to_string(), number, labels.to_vec()));
        Ok(())
    }

    async fn merge_pull_request(&self, number: u64) -> Result<()> {
        self.log.lock().unwrap().merged.push(number);
        Ok(())
    }

    async fn create_release(&self, tag: &str, notes: &str) -> Result<String> {
        self.log
            .lock()
            .unwrap()
            .releases
            .push((tag.to_string(), notes.to_string()));
        Ok(format!("https://github.com/acme/widget/releases/tag/{tag}"))
    }

    async fn verify_repository_access(&self) -> Result<bool> {
        Ok(self.log.lock().unwrap().access)
    }

    async fn get_commit_shas_for_pull_request(&self, _number: u64) -> Result<Vec<String>> {
        Ok(vec!["abc".to_string()])
    }

    async fn merged_pull_requests_for_commit(&self, _sha: &str) -> Result<Vec<NoteFragment>> {
        let mut log = self.log.lock().unwrap();
        log.commit_lookups += 1;
        if let Some(status) = log.notes_failure {
            return Err(HostingError::Api {
                status,
                message: "API rate limit exceeded".to_string(),
            }
            .into());
        }
        Ok(vec![NoteFragment {
            number: 5,
            title: "feat: calendar sync".to_string(),
            url: "https://github.com/acme/widget/pull/5".to_string(),
            author: Some("octocat".to_string()),
        }])
    }

    fn repository(&self) -> &RepoId {
        &self.repo
    }
}

// ---------------------------------------------------------------- config

#[derive(Default)]
pub struct FakeConfigStore {
    pub config: Mutex<UserConfig>,
    saves: Mutex<usize>,
}

impl FakeConfigStore {
    pub fn with_token(token: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            config: Mutex::new(UserConfig {
                token: token.map(String::from),
                ..Default::default()
            }),
            saves: Mutex::new(0),
        })
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    pub fn token(&self) -> Option<String> {
        self.config.lock().unwrap().token.clone()
    }
}

impl UserConfigStore for FakeConfigStore {
    fn load(&self) -> Result<UserConfig> {
        Ok(self.config.lock().unwrap().clone())
    }

    fn save(&self, config: &UserConfig) -> Result<()> {
        *self.config.lock().unwrap() = config.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------- harness

/// Every fake, reachable by the test after the orchestrator takes the toolbox
pub struct Harness {
    pub git: Arc<FakeGit>,
    pub recommender: Arc<FakeRecommender>,
    pub pm: Arc<FakePackageManager>,
    pub prompter: Arc<FakePrompter>,
    pub hosting: FakeConnector,
    pub config: Arc<FakeConfigStore>,
    pub env: EnvConfig,
}

impl Harness {
    pub fn new(script: GitScript) -> Self {
        let git = FakeGit::new(script);
        Self {
            hosting: FakeConnector::with_remote(git.remote.clone()),
            git,
            recommender: FakeRecommender::with_stats(stats(1, 0, 0)),
            pm: FakePackageManager::new(),
            prompter: FakePrompter::answering(&[]),
            config: FakeConfigStore::with_token(Some("ghp_saved")),
            env: EnvConfig::default(),
        }
    }

    pub fn toolbox(&self) -> Toolbox {
        Toolbox {
            git: self.git.clone(),
            recommender: self.recommender.clone(),
            package_manager: self.pm.clone(),
            prompter: self.prompter.clone(),
            hosting: Arc::new(self.hosting.clone()),
            config_store: self.config.clone(),
            env: self.env.clone(),
            output: OutputManager::quiet(),
        }
    }
}

/// Repository with develop/master branches and a previous `v1.2.3` release
pub fn released_repo() -> GitScript {
    GitScript {
        last_tag: Some("v1.2.3".to_string()),
        branches: vec!["develop".to_string(), "master".to_string()],
        tags: vec!["v1.2.3".to_string()],
        diff: vec!["src/lib.rs".to_string()],
        committed_files: vec!["CHANGELOG.md".to_string()],
        ..Default::default()
    }
}
