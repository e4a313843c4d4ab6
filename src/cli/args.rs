//! Command line argument parsing.
//!
//! Every subcommand shares the branch and interaction flags in
//! [`CommonArgs`]; subject flags differ per subcommand.

use crate::orchestrator::ReleaseParams;
use crate::subject::{SubjectKind, SubjectOptions};
use crate::version::{BumpType, parse_version};
use clap::{Args as ClapArgs, Parser, Subcommand};
use semver::Version;
use std::path::PathBuf;

/// Release extensions, npm packages and repositories through a release branch and pull request
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_release_flow",
    version,
    about = "Release extensions, npm packages and repositories",
    long_about = "Cut a release: compute the next version from conventional commits, open and merge a
release pull request on GitHub, tag the release branch, merge it back and publish.

Usage:
  kodegen_release_flow extension --instance ./site --name calendar
  kodegen_release_flow package --path ./my-lib --bump minor
  kodegen_release_flow monorepo --path ./workspace
  kodegen_release_flow legacy --subject repository --no-interactive"
)]
pub struct Args {
    /// Release flow to run
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every flow
#[derive(ClapArgs, Debug, Clone)]
pub struct CommonArgs {
    /// Development branch the release is cut from
    #[arg(long, default_value = "develop")]
    pub base: String,

    /// Prefix of the releasing branch (`{prefix}-{version}`)
    #[arg(long, default_value = "release")]
    pub branch_prefix: String,

    /// Git remote to push to
    #[arg(long, default_value = "origin")]
    pub remote: String,

    /// Branch that receives releases and tags
    #[arg(long, default_value = "master")]
    pub release_branch: String,

    /// Release exactly this version instead of the recommended one
    #[arg(long, value_parser = parse_release_version)]
    pub release_version: Option<Version>,

    /// Tag annotation, also used as release notes when none are found
    #[arg(long)]
    pub comment: Option<String>,

    /// Never prompt; use defaults or stop
    #[arg(long)]
    pub no_interactive: bool,

    /// Do not write the GitHub token to the user config
    #[arg(long)]
    pub no_write: bool,
}

/// Version flags shared by subject flows
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct VersionArgs {
    /// Tag to create instead of `v{version}`
    #[arg(long)]
    pub release_tag: Option<String>,

    /// Fixed bump instead of the commit-derived one
    #[arg(long, value_enum)]
    pub bump: Option<BumpType>,
}

/// Available flows
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Release an extension installed in an instance
    Extension {
        /// Branch and interaction flags
        #[command(flatten)]
        common: CommonArgs,
        /// Tag and bump flags
        #[command(flatten)]
        version: VersionArgs,
        /// Instance directory containing `extensions/`
        #[arg(long)]
        instance: PathBuf,
        /// Extension to release; prompted for when omitted
        #[arg(long)]
        name: Option<String>,
        /// Regenerate translations during the build
        #[arg(long)]
        translations: bool,
    },

    /// Release an npm package
    Package {
        /// Branch and interaction flags
        #[command(flatten)]
        common: CommonArgs,
        /// Tag and bump flags
        #[command(flatten)]
        version: VersionArgs,
        /// Package directory (defaults to the current directory)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Registry to publish to
        #[arg(long)]
        registry: Option<String>,
        /// Skip publishing
        #[arg(long)]
        no_publish: bool,
    },

    /// Release the members of an npm workspace monorepo
    Monorepo {
        /// Branch and interaction flags
        #[command(flatten)]
        common: CommonArgs,
        /// Tag and bump flags
        #[command(flatten)]
        version: VersionArgs,
        /// Workspace root (defaults to the current directory)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Registry to publish to
        #[arg(long)]
        registry: Option<String>,
        /// Skip publishing
        #[arg(long)]
        no_publish: bool,
    },

    /// Merge the releasing branch directly, without a pull request
    Legacy {
        /// Branch and interaction flags
        #[command(flatten)]
        common: CommonArgs,
        /// Tag and bump flags
        #[command(flatten)]
        version: VersionArgs,
        /// What is being released
        #[arg(long, value_enum, default_value_t = SubjectKind::Repository)]
        subject: SubjectKind,
        /// Instance directory (extension subjects)
        #[arg(long)]
        instance: Option<PathBuf>,
        /// Extension name (extension subjects)
        #[arg(long)]
        name: Option<String>,
        /// Regenerate translations (extension subjects)
        #[arg(long)]
        translations: bool,
        /// Package or repository directory
        #[arg(long)]
        path: Option<PathBuf>,
        /// Registry to publish to (package subjects)
        #[arg(long)]
        registry: Option<String>,
        /// Skip publishing
        #[arg(long)]
        no_publish: bool,
    },
}

fn parse_release_version(input: &str) -> Result<Version, String> {
    parse_version(input).map_err(|e| e.to_string())
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Command {
    /// Subcommand name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Extension { .. } => "extension",
            Command::Package { .. } => "package",
            Command::Monorepo { .. } => "monorepo",
            Command::Legacy { .. } => "legacy",
        }
    }

    /// Shared flags
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Extension { common, .. }
            | Command::Package { common, .. }
            | Command::Monorepo { common, .. }
            | Command::Legacy { common, .. } => common,
        }
    }

    fn version_args(&self) -> &VersionArgs {
        match self {
            Command::Extension { version, .. }
            | Command::Package { version, .. }
            | Command::Monorepo { version, .. }
            | Command::Legacy { version, .. } => version,
        }
    }

    fn no_publish(&self) -> bool {
        match self {
            Command::Package { no_publish, .. }
            | Command::Monorepo { no_publish, .. }
            | Command::Legacy { no_publish, .. } => *no_publish,
            Command::Extension { .. } => false,
        }
    }

    /// Kind of subject this flow releases
    pub fn subject_kind(&self) -> SubjectKind {
        match self {
            Command::Extension { .. } => SubjectKind::Extension,
            Command::Package { .. } | Command::Monorepo { .. } => SubjectKind::Package,
            Command::Legacy { subject, .. } => *subject,
        }
    }

    /// Subject flags
    pub fn subject_options(&self) -> SubjectOptions {
        match self.clone() {
            Command::Extension {
                instance,
                name,
                translations,
                ..
            } => SubjectOptions {
                instance: Some(instance),
                name,
                translations,
                ..Default::default()
            },
            Command::Package { path, registry, .. } => SubjectOptions {
                path,
                registry,
                ..Default::default()
            },
            Command::Monorepo { path, registry, .. } => SubjectOptions {
                path,
                registry,
                monorepo: true,
                ..Default::default()
            },
            Command::Legacy {
                instance,
                name,
                translations,
                path,
                registry,
                ..
            } => SubjectOptions {
                instance,
                name,
                translations,
                path,
                registry,
                monorepo: false,
            },
        }
    }

    /// Run parameters for the orchestrator
    pub fn params(&self) -> ReleaseParams {
        let common = self.common();
        let version = self.version_args();
        ReleaseParams {
            base_branch: common.base.clone(),
            branch_prefix: common.branch_prefix.clone(),
            remote: common.remote.clone(),
            release_branch: common.release_branch.clone(),
            release_version: common.release_version.clone(),
            release_tag: version.release_tag.clone(),
            bump: version.bump,
            comment: common.comment.clone(),
            interactive: !common.no_interactive,
            write_config: !common.no_write,
            publish: !self.no_publish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        let mut full = vec!["kodegen_release_flow"];
        full.extend_from_slice(args);
        Args::try_parse_from(full).unwrap().command
    }

    #[test]
    fn test_defaults() {
        let params = parse(&["package"]).params();
        assert_eq!(params, ReleaseParams::default());
    }

    #[test]
    fn test_flags_map_to_params() {
        let command = parse(&[
            "monorepo",
            "--base",
            "main",
            "--release-branch",
            "stable",
            "--bump",
            "minor",
            "--release-version",
            "v2.0.0",
            "--no-interactive",
            "--no-write",
            "--no-publish",
        ]);
        let params = command.params();
        assert_eq!(params.base_branch, "main");
        assert_eq!(params.release_branch, "stable");
        assert_eq!(params.bump, Some(BumpType::Minor));
        assert_eq!(params.release_version, Some(Version::new(2, 0, 0)));
        assert!(!params.interactive && !params.write_config && !params.publish);
        assert!(command.subject_options().monorepo);
    }

    #[test]
    fn test_extension_requires_instance() {
        assert!(Args::try_parse_from(["kodegen_release_flow", "extension"]).is_err());
    }

    #[test]
    fn test_legacy_subject_selector() {
        let command = parse(&["legacy", "--subject", "extension", "--instance", "/srv/site"]);
        assert_eq!(command.subject_kind(), SubjectKind::Extension);
        assert_eq!(
            command.subject_options().instance,
            Some(PathBuf::from("/srv/site"))
        );
    }

    #[test]
    fn test_invalid_bump_rejected() {
        assert!(Args::try_parse_from(["kodegen_release_flow", "package", "--bump", "huge"]).is_err());
    }
}
