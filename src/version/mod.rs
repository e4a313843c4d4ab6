//! Version management for releases.
//!
//! This module provides semantic version bumping, coercion of loosely formatted
//! tags, and commit-driven version recommendation.

mod bumper;
mod conventional;
mod recommender;

pub use bumper::{BumpType, get_version_from_tag, increment_version, parse_version};
pub use conventional::{CommitKind, CommitStats, ParsedCommit, parse_commit};
pub use recommender::{ConventionalRecommender, NextVersion, Recommendation, VersionRecommender};
