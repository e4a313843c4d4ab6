//! Error types for release orchestration.
//!
//! Every failure a release step can produce is one of these variants. The
//! `Terminated` variant is special: it is not a bug or an I/O failure but a
//! deliberate stop of the pipeline (user declined, nothing to release, invalid
//! input). The CLI maps it to an exit code after printing its message.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The pipeline stopped on purpose
    #[error("{0}")]
    Terminated(Termination),

    /// Version management errors
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// Git operation errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Hosting platform errors
    #[error("GitHub error: {0}")]
    Hosting(#[from] HostingError),

    /// Package manager errors
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    /// Run state misuse (a step ran out of order)
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Persisted configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why the pipeline was stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationKind {
    /// The operator answered "no" to a confirmation
    UserDeclined,
    /// No commits or no diff since the last release
    NothingToRelease,
    /// Input or repository state is not releasable
    Validation,
    /// The hosting token cannot access the repository
    InvalidCredentials,
    /// An automated merge hit conflicts that could not be recovered
    MergeConflict,
    /// The hosting platform did not open the release pull request
    PullRequestFailed,
}

impl TerminationKind {
    /// Process exit code for this kind of stop
    pub fn exit_code(self) -> i32 {
        match self {
            TerminationKind::UserDeclined | TerminationKind::NothingToRelease => 0,
            _ => 1,
        }
    }
}

/// A deliberate stop of the release pipeline with a message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    /// Category of the stop
    pub kind: TerminationKind,
    /// Human-readable explanation, printed before exit
    pub message: String,
}

impl Termination {
    /// Build a termination of the given kind
    pub fn new(kind: TerminationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Process exit code for this termination
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl ReleaseError {
    /// Shorthand for `ReleaseError::Terminated`
    pub fn terminate(kind: TerminationKind, message: impl Into<String>) -> Self {
        ReleaseError::Terminated(Termination::new(kind, message))
    }

    /// The termination carried by this error, if any
    pub fn termination(&self) -> Option<&Termination> {
        match self {
            ReleaseError::Terminated(t) => Some(t),
            _ => None,
        }
    }

    /// Exit code the driver should report for this error
    pub fn exit_code(&self) -> i32 {
        self.termination().map(Termination::exit_code).unwrap_or(1)
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Git(GitError::NotRepository { .. }) => vec![
                "Run the release from inside a git work tree".to_string(),
                "Pass --path pointing at the repository root".to_string(),
            ],
            ReleaseError::Git(GitError::CommandFailed { .. }) => vec![
                "Verify git remote URL: git remote -v".to_string(),
                "Check SSH key configuration: ssh -T git@github.com".to_string(),
            ],
            ReleaseError::Terminated(Termination {
                kind: TerminationKind::InvalidCredentials,
                ..
            }) => vec![
                "Create a token with the 'repo' scope".to_string(),
                "Export it as GH_TOKEN or remove the stale token from the config file".to_string(),
            ],
            ReleaseError::Terminated(Termination {
                kind: TerminationKind::MergeConflict,
                ..
            }) => vec![
                "Re-run interactively to resolve conflicts by hand".to_string(),
                "Abort the merge with: git merge --abort".to_string(),
            ],
            ReleaseError::Hosting(HostingError::Api { status: 401, .. }) => vec![
                "The GitHub token was rejected; generate a new one".to_string(),
            ],
            ReleaseError::Package(PackageError::CommandFailed { .. }) => vec![
                "Check you are logged in to the registry: npm whoami".to_string(),
            ],
            ReleaseError::State(_) => vec![
                "Release steps ran out of order; this is a bug in the driver".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

/// Version management errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// Invalid version format
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// Version string
        version: String,
        /// Reason for the error
        reason: String,
    },

    /// Version parsing failed
    #[error("Failed to parse version '{version}': {source}")]
    ParseFailed {
        /// Version string
        version: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },

    /// A tag could not be turned into a semantic version
    #[error("Cannot coerce tag '{tag}' into a semantic version")]
    Coercion {
        /// Tag that failed to coerce
        tag: String,
    },

    /// Unknown bump keyword
    #[error("Unknown bump type '{bump}'. Expected one of: patch, minor, major, none")]
    UnknownBump {
        /// Bump keyword
        bump: String,
    },
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository: {path}")]
    NotRepository {
        /// Path that was checked
        path: PathBuf,
    },

    /// git binary missing
    #[error("git executable not found in PATH")]
    GitNotFound,

    /// A merge stopped on conflicts; message starts with `CONFLICTS:`
    #[error("{message}")]
    Conflict {
        /// Conflict description listing the files
        message: String,
    },

    /// Any other failed git invocation
    #[error("git {command} failed: {reason}")]
    CommandFailed {
        /// Arguments passed to git
        command: String,
        /// stderr of the process
        reason: String,
    },

    /// Remote URL could not be turned into owner/repo
    #[error("Could not parse repository identifier from remote URL '{url}'")]
    UnparsableRemote {
        /// The remote URL
        url: String,
    },
}

/// Prefix every conflict message starts with
pub const CONFLICT_PREFIX: &str = "CONFLICTS:";

impl GitError {
    /// Whether this failure is a merge conflict
    pub fn is_conflict(&self) -> bool {
        match self {
            GitError::Conflict { message } => message.starts_with(CONFLICT_PREFIX),
            _ => false,
        }
    }
}

/// Hosting platform (GitHub) errors
#[derive(Error, Debug)]
pub enum HostingError {
    /// Transport failure
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        /// API endpoint
        endpoint: String,
        /// Underlying octocrab error
        #[source]
        source: octocrab::Error,
    },

    /// Non-success API response
    #[error("GitHub API returned {status}: {message}")]
    Api {
        /// HTTP status
        status: u16,
        /// Response message
        message: String,
    },

    /// The hosting client was used before `initialise_github_client`
    #[error("GitHub client is not initialised")]
    NotInitialised,
}

/// Package manager errors
#[derive(Error, Debug)]
pub enum PackageError {
    /// npm binary missing
    #[error("npm executable not found in PATH")]
    NpmNotFound,

    /// npm command failed
    #[error("npm {command} failed: {reason}")]
    CommandFailed {
        /// Arguments passed to npm
        command: String,
        /// stderr of the process
        reason: String,
    },

    /// Descriptor could not be read or is invalid
    #[error("Invalid package descriptor at {path}: {reason}")]
    InvalidDescriptor {
        /// Path of package.json
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Workspace glob could not be expanded
    #[error("Invalid workspace pattern '{pattern}': {reason}")]
    InvalidWorkspacePattern {
        /// The pattern
        pattern: String,
        /// Reason for the error
        reason: String,
    },

    /// Monorepo members depend on each other in a cycle
    #[error("Circular dependency detected involving package '{package}'")]
    Cycle {
        /// A package on the cycle
        package: String,
    },
}

/// Run state misuse
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
    /// A value was read before the step that produces it ran
    #[error("'{field}' is not set yet; the step that computes it has not run")]
    Missing {
        /// Field name
        field: &'static str,
    },

    /// A set-once value was written twice
    #[error("'{field}' is already set and cannot change during a run")]
    AlreadySet {
        /// Field name
        field: &'static str,
    },

    /// Version would not move forward
    #[error("Version {version} must be greater than {last_version}")]
    NotIncreasing {
        /// Candidate version
        version: String,
        /// Last released version
        last_version: String,
    },
}

/// Persisted configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No per-user config directory on this platform
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    /// Config file exists but is not a JSON object
    #[error("Config file {path} is corrupted: {reason}")]
    Corrupted {
        /// Path of the config file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Interactive prompt failed
    #[error("Prompt failed: {reason}")]
    PromptFailed {
        /// Reason for the error
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declines_exit_cleanly() {
        let err = ReleaseError::terminate(TerminationKind::UserDeclined, "Aborted");
        assert_eq!(err.exit_code(), 0);
        let err = ReleaseError::terminate(TerminationKind::NothingToRelease, "Nothing");
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_other_failures_exit_with_one() {
        let err = ReleaseError::terminate(TerminationKind::Validation, "bad");
        assert_eq!(err.exit_code(), 1);
        let err = ReleaseError::Git(GitError::GitNotFound);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_conflict_detection_uses_prefix() {
        let conflict = GitError::Conflict {
            message: format!("{CONFLICT_PREFIX} src/lib.rs"),
        };
        assert!(conflict.is_conflict());

        let other = GitError::CommandFailed {
            command: "merge".to_string(),
            reason: "fatal: refusing to merge unrelated histories".to_string(),
        };
        assert!(!other.is_conflict());
    }

    #[test]
    fn test_termination_display_is_message() {
        let err = ReleaseError::terminate(TerminationKind::Validation, "Tag v1.0.0 already exists");
        assert_eq!(err.to_string(), "Tag v1.0.0 already exists");
    }
}
