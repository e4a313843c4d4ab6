//! Repository identifiers derived from remote URLs.

use crate::error::{GitError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `owner/name` of a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Account or organisation
    pub owner: String,
    /// Repository name without `.git`
    pub name: String,
}

impl RepoId {
    /// Create an identifier
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Parse a repository reference.
    ///
    /// Supports:
    /// - SSH SCP-like: git@github.com:owner/repo.git
    /// - HTTPS / SSH URLs: https://github.com/owner/repo.git, ssh://git@host/owner/repo
    /// - npm shorthands: github:owner/repo, git+https://github.com/owner/repo.git
    /// - bare owner/repo
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        let unparsable = || GitError::UnparsableRemote {
            url: input.to_string(),
        };

        let path = if let Some(rest) = raw.strip_prefix("github:") {
            rest.to_string()
        } else if raw.contains("://") {
            let normalized = raw.strip_prefix("git+").unwrap_or(raw);
            let parsed = url::Url::parse(normalized).map_err(|_| unparsable())?;
            parsed.path().trim_start_matches('/').to_string()
        } else if raw.contains('@') && raw.contains(':') {
            // SCP-like syntax: user@host:path
            raw.split_once(':').map(|(_, p)| p.to_string()).ok_or_else(unparsable)?
        } else {
            raw.to_string()
        };

        let path = path.trim_end_matches('/').trim_end_matches(".git");
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        match parts.as_slice() {
            [.., owner, name] => Ok(Self::new(*owner, *name)),
            _ => Err(unparsable().into()),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
