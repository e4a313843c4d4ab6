//! Commit-driven next-version recommendation.

use crate::error::Result;
use crate::git::SourceControlClient;
use crate::version::{BumpType, CommitStats, increment_version, parse_commit};
use async_trait::async_trait;
use semver::Version;
use std::path::Path;
use std::sync::Arc;

/// What the commit history says about the next release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    /// Bump implied by the commits
    pub release_type: BumpType,
    /// Human-readable explanation
    pub reason: String,
    /// Commit tallies
    pub stats: CommitStats,
}

/// Recommended version plus the evidence behind it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextVersion {
    /// Version to release
    pub version: Version,
    /// Why this version was chosen
    pub recommendation: Recommendation,
}

/// Computes the next version from commit history
#[async_trait]
pub trait VersionRecommender: Send + Sync {
    /// Recommend the version following `last_version`.
    ///
    /// Commits are taken from `last_tag` (exclusive) to `HEAD`, limited to
    /// `subpath` when given.
    async fn get_next_version(
        &self,
        root: &Path,
        last_version: &Version,
        last_tag: Option<&str>,
        subpath: Option<&Path>,
    ) -> Result<NextVersion>;
}

/// Recommender reading commits through a [`SourceControlClient`]
pub struct ConventionalRecommender {
    git: Arc<dyn SourceControlClient>,
}

impl ConventionalRecommender {
    /// Create a recommender backed by `git`
    pub fn new(git: Arc<dyn SourceControlClient>) -> Self {
        Self { git }
    }
}

#[async_trait]
impl VersionRecommender for ConventionalRecommender {
    async fn get_next_version(
        &self,
        root: &Path,
        last_version: &Version,
        last_tag: Option<&str>,
        subpath: Option<&Path>,
    ) -> Result<NextVersion> {
        let messages = self.git.commit_messages(root, last_tag, subpath).await?;
        let parsed: Vec<_> = messages.iter().map(parse_commit).collect();
        let stats = CommitStats::from_commits(&parsed);
        let release_type = stats.release_type();

        log::debug!(
            "{} commit(s) since {} under {}: {:?}",
            stats.commits,
            last_tag.unwrap_or("the first commit"),
            subpath.map(|p| p.display().to_string()).unwrap_or_else(|| ".".to_string()),
            release_type
        );

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
