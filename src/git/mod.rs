//! Git integration for release workflows.
//!
//! The orchestrator talks to version control only through the
//! [`SourceControlClient`] trait; [`GitCli`] is the production implementation
//! driving the system `git` binary.

mod git_adapter;
mod operations;
mod remote;

pub use git_adapter::GitCli;
pub use operations::{CommitMessage, SourceControlClient};
pub use remote::RepoId;
