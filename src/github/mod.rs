//! GitHub integration for release operations

mod client;
mod notes;
mod release_manager;

pub use client::{HostingClient, HostingConnector, NoteFragment, PR_STATE_OPEN, PullRequestResult};
pub use notes::format_release_notes;
pub use release_manager::{GITHUB_API, GitHubConnector, GitHubReleaseConfig, GitHubReleaseManager};
