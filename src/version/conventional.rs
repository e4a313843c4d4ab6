//! Conventional commit parsing and statistics.

use crate::git::CommitMessage;
use crate::version::BumpType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>[A-Za-z]+)(?:\((?P<scope>[^)]*)\))?(?P<breaking>!)?: (?P<desc>\S.*)$")
        .expect("conventional header regex is valid")
});

/// Classification of one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitKind {
    /// `feat:`
    Feature,
    /// `fix:`
    Fix,
    /// Any other conventional type (`docs:`, `chore:`, ...)
    Other(String),
    /// Subject does not follow the convention
    Unset,
}

/// A commit message split into its conventional parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    /// Commit SHA
    pub sha: String,
    /// Type classification
    pub kind: CommitKind,
    /// Optional scope in parentheses
    pub scope: Option<String>,
    /// Whether the commit announces a breaking change
    pub breaking: bool,
    /// Description after the colon (or the whole subject when unset)
    pub description: String,
}

/// Parse one commit message
pub fn parse_commit(commit: &CommitMessage) -> ParsedCommit {
    let subject = commit.subject.trim();
    let footer_breaking = commit
        .body
        .lines()
        .any(|l| l.starts_with("BREAKING CHANGE:") || l.starts_with("BREAKING-CHANGE:"));

    match HEADER_RE.captures(subject) {
        Some(caps) => {
            let ty = caps["type"].to_ascii_lowercase();
            let kind = match ty.as_str() {
                "feat" | "feature" => CommitKind::Feature,
                "fix" => CommitKind::Fix,
                _ => CommitKind::Other(ty),
            };
            ParsedCommit {
                sha: commit.sha.clone(),
                kind,
                scope: caps.name("scope").map(|m| m.as_str().to_string()),
                breaking: caps.name("breaking").is_some() || footer_breaking,
                description: caps["desc"].to_string(),
            }
        }
        None => ParsedCommit {
            sha: commit.sha.clone(),
            kind: CommitKind::Unset,
            scope: None,
            breaking: false,
            description: subject.to_string(),
        },
    }
}

/// Counts gathered over a commit range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    /// All commits in the range
    pub commits: usize,
    /// Commits without a conventional header
    pub unset: usize,
    /// `feat` commits
    pub features: usize,
    /// `fix` commits
    pub fix: usize,
    /// Commits flagged as breaking
    pub breakings: usize,
}

impl CommitStats {
    /// Tally a list of parsed commits
    pub fn from_commits(commits: &[ParsedCommit]) -> Self {
        let mut stats = CommitStats {
            commits: commits.len(),
            ..Default::default()
        };
        for commit in commits {
            match commit.kind {
                CommitKind::Feature => stats.features += 1,
                CommitKind::Fix => stats.fix += 1,
                CommitKind::Unset => stats.unset += 1,
                CommitKind::Other(_) => {}
            }
            if commit.breaking {
                stats.breakings += 1;
            }
        }
        stats
    }

    /// No commits at all since the last release
    pub fn is_empty(&self) -> bool {
        self.commits == 0
    }

    /// Every commit in the range lacks a conventional header
    pub fn only_unset(&self) -> bool {
        self.commits > 0 && self.unset == self.commits
    }

    /// Bump implied by the tallies
    pub fn release_type(&self) -> BumpType {
        if self.commits == 0 {
            BumpType::None
        } else if self.breakings > 0 {
            BumpType::Major
        } else if self.features > 0 {
            BumpType::Minor
        } else {
            BumpType::Patch
        }
    }

    /// One-line explanation of `release_type`
    pub fn reason(&self) -> String {
        format!(
            "There are {} BREAKING CHANGES, {} features and {} fixes in {} commits ({} without a conventional header)",
            self.breakings, self.features, self.fix, self.commits, self.unset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(subject: &str, body: &str) -> CommitMessage {
        CommitMessage {
            sha: "abc123".to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_parse_feature_with_scope() {
        let parsed = parse_commit(&commit("feat(cli): add --bump flag", ""));
        assert_eq!(parsed.kind, CommitKind::Feature);
        assert_eq!(parsed.scope.as_deref(), Some("cli"));
        assert!(!parsed.breaking);
        assert_eq!(parsed.description, "add --bump flag");
    }

    #[test]
    fn test_parse_bang_is_breaking() {
        let parsed = parse_commit(&commit("refactor!: drop legacy flow", ""));
        assert_eq!(parsed.kind, CommitKind::Other("refactor".to_string()));
        assert!(parsed.breaking);
    }

    #[test]
    fn test_parse_footer_is_breaking() {
        let parsed = parse_commit(&commit("fix: rename option", "BREAKING CHANGE: --foo is gone"));
        assert_eq!(parsed.kind, CommitKind::Fix);
        assert!(parsed.breaking);
    }

    #[test]
    fn test_parse_unset() {
        let parsed = parse_commit(&commit("Update README", ""));
        assert_eq!(parsed.kind, CommitKind::Unset);
        assert_eq!(parsed.description, "Update README");
    }

    #[test]
    fn test_stats_release_type() {
        let parsed: Vec<_> = [
            commit("feat: one", ""),
            commit("fix: two", ""),
            commit("random words", ""),
        ]
        .iter()
        .map(parse_commit)
        .collect();
        let stats = CommitStats::from_commits(&parsed);
        assert_eq!(stats.commits, 3);
        assert_eq!(stats.features, 1);
        assert_eq!(stats.fix, 1);
        assert_eq!(stats.unset, 1);
        assert_eq!(stats.release_type(), BumpType::Minor);
        assert!(!stats.only_unset());
    }

    #[test]
    fn test_stats_only_unset_defaults_to_patch() {
        let parsed: Vec<_> = [commit("wip", ""), commit("more wip", "")]
            .iter()
            .map(parse_commit)
            .collect();
        let stats = CommitStats::from_commits(&parsed);
        assert!(stats.only_unset());
        assert_eq!(stats.release_type(), BumpType::Patch);
    }

    #[test]
    fn test_empty_stats() {
        let stats = CommitStats::from_commits(&[]);
        assert!(stats.is_empty());
        assert_eq!(stats.release_type(), BumpType::None);
    }
}
