//! # kodegen_release_flow
//!
//! Interactive release orchestration for extensions, npm packages, npm
//! workspace monorepos and plain repositories.
//!
//! A release runs a fixed sequence of steps: select the subject, compute the
//! next version from conventional commits, cut a releasing branch, build and
//! bump the version, open and merge a release pull request on GitHub, tag the
//! release branch, create the GitHub release, merge back into the development
//! branch and publish.
//!
//! ## Usage
//!
//! ```bash
//! kodegen_release_flow package --bump minor
//! kodegen_release_flow extension --instance ./site --name calendar
//! kodegen_release_flow monorepo --no-interactive
//! kodegen_release_flow legacy --subject repository
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod metadata;
pub mod orchestrator;
pub mod package;
pub mod process;
pub mod prompt;
pub mod state;
pub mod subject;
pub mod toolbox;
pub mod version;

// Re-export main types for public API
pub use cli::Args;
pub use error::{ReleaseError, Result, Termination, TerminationKind};
pub use git::{GitCli, SourceControlClient};
pub use github::{HostingClient, HostingConnector};
pub use orchestrator::{ReleaseOrchestrator, ReleaseParams, Step};
pub use package::{Npm, PackageManager};
pub use state::{ReleasePhase, RunState};
pub use subject::{Subject, SubjectKind, SubjectOptions};
pub use toolbox::Toolbox;
pub use version::{BumpType, VersionRecommender};
