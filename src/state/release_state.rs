//! Run state tracking and release phases.

use crate::error::{Result, StateError};
use crate::metadata::SubjectMetadata;
use semver::Version;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the short-lived branch that stages a release
pub fn releasing_branch_name(branch_prefix: &str, version: &Version) -> String {
    format!("{branch_prefix}-{version}")
}

/// Phase of the release pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleasePhase {
    /// Nothing has run yet
    Idle,
    /// Subject chosen and working root known
    TargetSelected,
    /// GitHub token verified against the repository
    CredentialsVerified,
    /// Next version and tag computed
    VersionExtracted,
    /// Releasing branch created from the base branch
    BranchCreated,
    /// Subject built
    Built,
    /// Version persisted and pushed
    VersionBumped,
    /// Release pull request open
    PRCreated,
    /// Release notes collected
    NotesExtracted,
    /// Release pull request merged
    PRMerged,
    /// Release tag pushed
    Tagged,
    /// GitHub release created
    Released,
    /// Release branch merged back into base
    MergedBack,
    /// Releasing branch deleted
    BranchRemoved,
    /// Artifact published
    Published,
    /// Pipeline finished
    Done,
}

impl fmt::Display for ReleasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleasePhase::Idle => "idle",
            ReleasePhase::TargetSelected => "target selected",
            ReleasePhase::CredentialsVerified => "credentials verified",
            ReleasePhase::VersionExtracted => "version extracted",
            ReleasePhase::BranchCreated => "branch created",
            ReleasePhase::Built => "built",
            ReleasePhase::VersionBumped => "version bumped",
            ReleasePhase::PRCreated => "pull request created",
            ReleasePhase::NotesExtracted => "notes extracted",
            ReleasePhase::PRMerged => "pull request merged",
            ReleasePhase::Tagged => "tagged",
            ReleasePhase::Released => "released",
            ReleasePhase::MergedBack => "merged back",
            ReleasePhase::BranchRemoved => "branch removed",
            ReleasePhase::Published => "published",
            ReleasePhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// The extension, package or repository being released
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectInfo {
    /// Subject name
    pub name: String,
    /// Directory every git and npm call runs in
    pub path: PathBuf,
}

/// Release pull request identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Web page of the pull request
    pub url: String,
    /// REST API URL of the pull request
    pub api_url: String,
    /// Pull request number
    pub number: u64,
    /// Pull request id
    pub id: Option<u64>,
    /// `owner/repo` of the head repository
    pub full_name: String,
    /// Release notes, once extracted
    pub notes: Option<String>,
}

/// Version plan for one monorepo member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonorepoPackage {
    /// Package name
    pub package_name: String,
    /// Directory relative to the monorepo root
    pub package_path: PathBuf,
    /// Version in the descriptor before the release
    pub last_version: Version,
    /// Version to release
    pub version: Version,
    /// Sibling packages it depends on
    pub dependencies: Vec<String>,
    /// No commits touched the package and no bump was forced
    pub no_changes: bool,
    /// Why `version` was chosen
    pub reason: String,
    /// `private: true` packages are versioned but never published
    pub private: bool,
}

/// Everything a release run has learned so far
#[derive(Debug, Clone)]
pub struct RunState {
    started_at: chrono::DateTime<chrono::Utc>,
    phase: ReleasePhase,
    working_root: Option<PathBuf>,
    token: Option<String>,
    subject: Option<SubjectInfo>,
    metadata: Option<SubjectMetadata>,
    last_version: Option<Version>,
    last_tag: Option<String>,
    version: Option<Version>,
    tag: Option<String>,
    releasing_branch: Option<String>,
    pull_request: Option<PullRequest>,
    sign_tags_enabled: bool,
    monorepo_packages: Vec<MonorepoPackage>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    /// Empty state at the start of a run
    pub fn new() -> Self {
        Self {
            started_at: chrono::Utc::now(),
            phase: ReleasePhase::Idle,
            working_root: None,
            token: None,
            subject: None,
            metadata: None,
            last_version: None,
            last_tag: None,
            version: None,
            tag: None,
            releasing_branch: None,
            pull_request: None,
            sign_tags_enabled: false,
            monorepo_packages: Vec::new(),
        }
    }

    /// When the run started
    pub fn started_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.started_at
    }

    /// Last phase reached
    pub fn phase(&self) -> ReleasePhase {
        self.phase
    }

    /// Move to a later phase; going backwards is ignored
    pub fn advance(&mut self, phase: ReleasePhase) {
        if phase > self.phase {
            log::debug!("Release phase: {} -> {}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Record the selected subject; its path becomes the working root
    pub fn set_subject(&mut self, subject: SubjectInfo) -> Result<()> {
        if self.subject.is_some() {
            return Err(StateError::AlreadySet { field: "subject" }.into());
        }
        self.working_root = Some(subject.path.clone());
        self.subject = Some(subject);
        Ok(())
    }

    /// The selected subject
    pub fn subject(&self) -> Result<&SubjectInfo> {
        self.subject.as_ref().ok_or_else(|| StateError::Missing { field: "subject" }.into())
    }

    /// Directory every collaborator call runs in
    pub fn working_root(&self) -> Result<&Path> {
        self.working_root
            .as_deref()
            .ok_or_else(|| StateError::Missing { field: "working_root" }.into())
    }

    /// Record subject metadata
    pub fn set_metadata(&mut self, metadata: SubjectMetadata) -> Result<()> {
        if self.metadata.is_some() {
            return Err(StateError::AlreadySet { field: "metadata" }.into());
        }
        self.metadata = Some(metadata);
        Ok(())
    }

    /// Subject metadata
    pub fn metadata(&self) -> Result<&SubjectMetadata> {
        self.metadata.as_ref().ok_or_else(|| StateError::Missing { field: "metadata" }.into())
    }

    /// Record the previous release
    pub fn set_last_release(&mut self, last_version: Version, last_tag: Option<String>) -> Result<()> {
        if self.last_version.is_some() {
            return Err(StateError::AlreadySet { field: "last_version" }.into());
        }
        self.last_version = Some(last_version);
        self.last_tag = last_tag;
        Ok(())
    }

    /// Version of the previous release
    pub fn last_version(&self) -> Result<&Version> {
        self.last_version
            .as_ref()
            .ok_or_else(|| StateError::Missing { field: "last_version" }.into())
    }

    /// Tag of the previous release; `None` before the first release
    pub fn last_tag(&self) -> Option<&str> {
        self.last_tag.as_deref()
    }

    /// Record the version being released along with its tag and releasing branch.
    ///
    /// `version` must be strictly greater than the last version.
    pub fn set_release(&mut self, version: Version, tag: String, branch_prefix: &str) -> Result<()> {
        if self.version.is_some() {
            return Err(StateError::AlreadySet { field: "version" }.into());
        }
        let last_version = self.last_version()?;
        if version <= *last_version {
            return Err(StateError::NotIncreasing {
                version: version.to_string(),
                last_version: last_version.to_string(),
            }
            .into());
        }
        self.releasing_branch = Some(releasing_branch_name(branch_prefix, &version));
        self.version = Some(version);
        self.tag = Some(tag);
        Ok(())
    }

    /// Version being released
    pub fn version(&self) -> Result<&Version> {
        self.version.as_ref().ok_or_else(|| StateError::Missing { field: "version" }.into())
    }

    /// Tag being released
    pub fn tag(&self) -> Result<&str> {
        self.tag.as_deref().ok_or_else(|| StateError::Missing { field: "tag" }.into())
    }

    /// `{branch_prefix}-{version}`
    pub fn releasing_branch(&self) -> Result<&str> {
        self.releasing_branch
            .as_deref()
            .ok_or_else(|| StateError::Missing { field: "releasing_branch" }.into())
    }

    /// GitHub token, once resolved
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Store the GitHub token
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Release pull request, when one was opened
    pub fn pull_request(&self) -> Option<&PullRequest> {
        self.pull_request.as_ref()
    }

    /// Record the release pull request
    pub fn set_pull_request(&mut self, pull_request: PullRequest) -> Result<()> {
        if self.pull_request.is_some() {
            return Err(StateError::AlreadySet { field: "pull_request" }.into());
        }
        self.pull_request = Some(pull_request);
        Ok(())
    }

    /// Attach release notes to the pull request
    pub fn set_release_notes(&mut self, notes: String) -> Result<()> {
        let pull_request = self
            .pull_request
            .as_mut()
            .ok_or(StateError::Missing { field: "pull_request" })?;
        pull_request.notes = Some(notes);
        Ok(())
    }

    /// Whether tags are signed
    pub fn sign_tags_enabled(&self) -> bool {
        self.sign_tags_enabled
    }

    /// Set tag signing
    pub fn set_sign_tags_enabled(&mut self, enabled: bool) {
        self.sign_tags_enabled = enabled;
    }

    /// Monorepo member plans, empty outside monorepo runs
    pub fn monorepo_packages(&self) -> &[MonorepoPackage] {
        &self.monorepo_packages
    }

    /// Record monorepo member plans
    pub fn set_monorepo_packages(&mut self, packages: Vec<MonorepoPackage>) -> Result<()> {
        if !self.monorepo_packages.is_empty() {
            return Err(StateError::AlreadySet {
                field: "monorepo_packages",
            }
            .into());
        }
        if let Some(p) = packages.iter().find(|p| p.version < p.last_version) {
            return Err(StateError::NotIncreasing {
                version: p.version.to_string(),
                last_version: p.last_version.to_string(),
            }
            .into());
        }
        self.monorepo_packages = packages;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReleaseError;

    fn state_err(result: Result<()>) -> StateError {
        match result {
            Err(ReleaseError::State(e)) => e,
            other => panic!("expected state error, got {other:?}"),
        }
    }

    #[test]
    fn test_releasing_branch_with_prerelease() {
        let v = Version::parse("2.0.0-beta.1").unwrap();
        assert_eq!(releasing_branch_name("release", &v), "release-2.0.0-beta.1");
        assert_eq!(releasing_branch_name("rc/x", &v), "rc/x-2.0.0-beta.1");
    }

    #[test]
    fn test_subject_is_set_once() {
        let mut state = RunState::new();
        let info = SubjectInfo {
            name: "a".to_string(),
            path: PathBuf::from("/tmp/a"),
        };
        state.set_subject(info.clone()).unwrap();
        assert_eq!(state.working_root().unwrap(), Path::new("/tmp/a"));
        assert_eq!(
            state_err(state.set_subject(info)),
            StateError::AlreadySet { field: "subject" }
        );
    }

    #[test]
    fn test_release_requires_last_version() {
        let mut state = RunState::new();
        assert_eq!(
            state_err(state.set_release(Version::new(1, 0, 0), "v1.0.0".into(), "release")),
            StateError::Missing { field: "last_version" }
        );
    }

    #[test]
    fn test_release_must_increase() {
        let mut state = RunState::new();
        state.set_last_release(Version::new(1, 2, 3), Some("v1.2.3".into())).unwrap();
        let err = state_err(state.set_release(Version::new(1, 2, 3), "v1.2.3".into(), "release"));
        assert!(matches!(err, StateError::NotIncreasing { .. }));

        state
            .set_release(Version::new(1, 3, 0), "v1.3.0".into(), "release")
            .unwrap();
        assert_eq!(state.releasing_branch().unwrap(), "release-1.3.0");
        assert_eq!(state.tag().unwrap(), "v1.3.0");
    }

    #[test]
    fn test_phase_only_moves_forward() {
        let mut state = RunState::new();
        state.advance(ReleasePhase::Built);
        state.advance(ReleasePhase::TargetSelected);
        assert_eq!(state.phase(), ReleasePhase::Built);
    }

    #[test]
    fn test_notes_need_pull_request() {
        let mut state = RunState::new();
        assert!(state.set_release_notes("notes".into()).is_err());
    }
}
