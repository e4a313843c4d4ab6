//! Release orchestration state machine.
//!
//! [`ReleaseOrchestrator`] exposes one async method per release step. The
//! driver calls them in a fixed order (see [`Step`]); each step reads what
//! earlier steps stored in [`RunState`], performs one unit of work and records
//! its result. Deliberate stops surface as
//! [`ReleaseError::Terminated`](crate::error::ReleaseError::Terminated).

mod artifact;
mod branches;
mod hosting;
mod policy;
mod target;
mod versioning;

pub use policy::{FailurePolicy, failure_policy};
pub use versioning::propagate_dependency_updates;

use crate::error::{HostingError, Result};
use crate::github::HostingClient;
use crate::state::{ReleasePhase, RunState};
use crate::subject::{Subject, SubjectContext};
use crate::toolbox::Toolbox;
use crate::version::BumpType;
use semver::Version;
use std::fmt;
use std::time::Duration;

/// Label attached to release pull requests
pub const RELEASE_LABEL: &str = "release";

/// Delay between the approval prompt and opening the pull request page
pub const BROWSER_DELAY: Duration = Duration::from_secs(1);

/// Where to look when GitHub refuses to open the pull request
pub const PR_TROUBLESHOOTING_URL: &str =
    "https://docs.github.com/en/rest/pulls/pulls#create-a-pull-request";

/// Immutable parameters of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseParams {
    /// Development branch releases are cut from
    pub base_branch: String,
    /// Prefix of the releasing branch
    pub branch_prefix: String,
    /// Git remote name
    pub remote: String,
    /// Branch releases are merged into and tagged on
    pub release_branch: String,
    /// Explicit version, overriding the recommendation
    pub release_version: Option<Version>,
    /// Custom tag instead of `v{version}`
    pub release_tag: Option<String>,
    /// Fixed bump instead of the commit-derived one
    pub bump: Option<BumpType>,
    /// Tag annotation and fallback release notes
    pub comment: Option<String>,
    /// Whether the operator can be asked questions
    pub interactive: bool,
    /// Whether an acquired token is written to the user config
    pub write_config: bool,
    /// Whether the publish step publishes anything
    pub publish: bool,
}

impl Default for ReleaseParams {
    fn default() -> Self {
        Self {
            base_branch: "develop".to_string(),
            branch_prefix: "release".to_string(),
            remote: "origin".to_string(),
            release_branch: "master".to_string(),
            release_version: None,
            release_tag: None,
            bump: None,
            comment: None,
            interactive: true,
            write_config: true,
            publish: true,
        }
    }
}

/// A release step; each variant runs the orchestrator method of the same name
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SelectTarget,
    InitialiseGitClient,
    VerifyLocalChanges,
    SignTags,
    VerifyBranches,
    ExtractVersion,
    ExtractMonorepoVersions,
    PruneRemoteOrigin,
    DoesTagExists,
    DoesReleasingBranchExists,
    IsReleaseRequired,
    ConfirmRelease,
    CreateReleasingBranch,
    Build,
    UpdateVersion,
    InitialiseGithubClient,
    VerifyCredentials,
    CreatePullRequest,
    ExtractReleaseNotes,
    MergePullRequest,
    MergeWithReleaseBranch,
    CreateReleaseTag,
    CreateGithubRelease,
    MergeBack,
    RemoveReleasingBranch,
    Publish,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::SelectTarget => "select target",
            Step::InitialiseGitClient => "initialise git client",
            Step::VerifyLocalChanges => "verify local changes",
            Step::SignTags => "sign tags",
            Step::VerifyBranches => "verify branches",
            Step::ExtractVersion => "extract version",
            Step::ExtractMonorepoVersions => "extract monorepo versions",
            Step::PruneRemoteOrigin => "prune remote",
            Step::DoesTagExists => "check tag",
            Step::DoesReleasingBranchExists => "check releasing branch",
            Step::IsReleaseRequired => "check for changes",
            Step::ConfirmRelease => "confirm release",
            Step::CreateReleasingBranch => "create releasing branch",
            Step::Build => "build",
            Step::UpdateVersion => "update version",
            Step::InitialiseGithubClient => "initialise GitHub client",
            Step::VerifyCredentials => "verify credentials",
            Step::CreatePullRequest => "create pull request",
            Step::ExtractReleaseNotes => "extract release notes",
            Step::MergePullRequest => "merge pull request",
            Step::MergeWithReleaseBranch => "merge into release branch",
            Step::CreateReleaseTag => "create release tag",
            Step::CreateGithubRelease => "create GitHub release",
            Step::MergeBack => "merge back",
            Step::RemoveReleasingBranch => "remove releasing branch",
            Step::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Drives one release of one subject
pub struct ReleaseOrchestrator {
    params: ReleaseParams,
    subject: Subject,
    tools: Toolbox,
    state: RunState,
    hosting_client: Option<Box<dyn HostingClient>>,
}

impl ReleaseOrchestrator {
    /// Orchestrator for `subject` with an empty run state
    pub fn new(params: ReleaseParams, subject: Subject, tools: Toolbox) -> Self {
        Self {
            params,
            subject,
            tools,
            state: RunState::new(),
            hosting_client: None,
        }
    }

    /// Run parameters
    pub fn params(&self) -> &ReleaseParams {
        &self.params
    }

    /// Bound subject
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Run state so far
    pub fn state(&self) -> &RunState {
        &self.state
    }

    fn ctx(&self) -> SubjectContext<'_> {
        SubjectContext {
            state: &self.state,
            tools: &self.tools,
            interactive: self.params.interactive,
        }
    }

    fn hosting(&self) -> Result<&dyn HostingClient> {
        self.hosting_client
            .as_deref()
            .ok_or_else(|| HostingError::NotInitialised.into())
    }

    /// Run a single step
    pub async fn run_step(&mut self, step: Step) -> Result<()> {
        log::info!("Step: {step}");
        match step {
            Step::SelectTarget => self.select_target().await,
            Step::InitialiseGitClient => self.initialise_git_client().await,
            Step::VerifyLocalChanges => self.verify_local_changes().await,
            Step::SignTags => self.sign_tags().await,
            Step::VerifyBranches => self.verify_branches().await,
            Step::ExtractVersion => self.extract_version().await,
            Step::ExtractMonorepoVersions => self.extract_monorepo_versions().await,
            Step::PruneRemoteOrigin => self.prune_remote_origin().await,
            Step::DoesTagExists => self.does_tag_exists().await,
            Step::DoesReleasingBranchExists => self.does_releasing_branch_exists().await,
            Step::IsReleaseRequired => self.is_release_required().await,
            Step::ConfirmRelease => self.confirm_release().await,
            Step::CreateReleasingBranch => self.create_releasing_branch().await,
            Step::Build => self.build().await,
            Step::UpdateVersion => self.update_version().await,
            Step::InitialiseGithubClient => self.initialise_github_client().await,
            Step::VerifyCredentials => self.verify_credentials().await,
            Step::CreatePullRequest => self.create_pull_request().await,
            Step::ExtractReleaseNotes => self.extract_release_notes().await,
            Step::MergePullRequest => self.merge_pull_request().await,
            Step::MergeWithReleaseBranch => self.merge_with_release_branch().await,
            Step::CreateReleaseTag => self.create_release_tag().await,
            Step::CreateGithubRelease => self.create_github_release().await,
            Step::MergeBack => self.merge_back().await,
            Step::RemoveReleasingBranch => self.remove_releasing_branch().await,
            Step::Publish => self.publish().await,
        }
    }

    /// Run `steps` in order, stopping at the first failure
    pub async fn run(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            if let Err(e) = self.run_step(*step).await {
                log::debug!("Stopped at '{step}' after phase '{}'", self.state.phase());
                return Err(e);
            }
        }
        self.state.advance(ReleasePhase::Done);
        let elapsed = chrono::Utc::now() - self.state.started_at();
        log::info!("Release finished in {}s", elapsed.num_seconds());
        Ok(())
    }
}
