//! What is being released and how it is built, versioned and published.
//!
//! A run binds exactly one [`Subject`], chosen up front from a
//! [`SubjectKind`]. The orchestrator owns the run state and hands subjects a
//! read-only [`SubjectContext`].

mod extension;
mod package;
mod repository;

pub use extension::{EXTENSIONS_DIR, ExtensionSubject};
pub use package::PackageSubject;
pub use repository::RepositorySubject;

use crate::error::{CliError, ReleaseError, Result, TerminationKind};
use crate::metadata::SubjectMetadata;
use crate::package::MonorepoMember;
use crate::state::{MonorepoPackage, RunState, SubjectInfo};
use crate::toolbox::Toolbox;
use clap::ValueEnum;
use semver::Version;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of release subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SubjectKind {
    /// An extension installed in a host instance
    Extension,
    /// An npm package (or monorepo)
    Package,
    /// A bare repository released by tag only
    Repository,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubjectKind::Extension => "extension",
            SubjectKind::Package => "package",
            SubjectKind::Repository => "repository",
        })
    }
}

/// Subject-specific command-line options
#[derive(Debug, Clone, Default)]
pub struct SubjectOptions {
    /// Host instance holding `extensions/`
    pub instance: Option<PathBuf>,
    /// Extension name inside the instance
    pub name: Option<String>,
    /// Regenerate translations while building an extension
    pub translations: bool,
    /// Package or repository directory; defaults to the current directory
    pub path: Option<PathBuf>,
    /// Registry to publish to
    pub registry: Option<String>,
    /// Treat the package as a monorepo root
    pub monorepo: bool,
}

/// Read-only view of the run handed to subject operations
#[derive(Clone, Copy)]
pub struct SubjectContext<'a> {
    /// Run state so far
    pub state: &'a RunState,
    /// Collaborators
    pub tools: &'a Toolbox,
    /// Whether the operator can be asked questions
    pub interactive: bool,
}

impl SubjectContext<'_> {
    /// Directory of the selected subject
    pub fn root(&self) -> Result<&Path> {
        self.state.working_root()
    }
}

/// One unit of work performed while building a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTask {
    /// `npm install`
    Install,
    /// The package's `build` script
    Build,
    /// Extension asset bundling
    BundleAssets,
    /// Extension translation regeneration
    Translations,
}

impl fmt::Display for BuildTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildTask::Install => "dependency install",
            BuildTask::Build => "build",
            BuildTask::BundleAssets => "asset bundling",
            BuildTask::Translations => "translation generation",
        })
    }
}

/// The release subject bound to a run
#[derive(Debug, Clone)]
pub enum Subject {
    /// Extension inside a host instance
    Extension(ExtensionSubject),
    /// npm package or monorepo
    Package(PackageSubject),
    /// Repository released by tag only
    Repository(RepositorySubject),
}

/// Termination for a target that is missing its marker file or structure
pub(crate) fn invalid_target(message: impl Into<String>) -> ReleaseError {
    ReleaseError::terminate(TerminationKind::Validation, message)
}

/// `path` or the process working directory
pub(crate) fn resolve_dir(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}

impl Subject {
    /// Build the subject for `kind` from command-line options
    pub fn new(kind: SubjectKind, options: SubjectOptions) -> Result<Self> {
        Ok(match kind {
            SubjectKind::Extension => {
                let instance = options.instance.ok_or_else(|| CliError::InvalidArguments {
                    reason: "--instance is required for extension releases".to_string(),
                })?;
                Subject::Extension(ExtensionSubject::new(instance, options.name, options.translations))
            }
            SubjectKind::Package => {
                Subject::Package(PackageSubject::new(options.path, options.registry, options.monorepo))
            }
            SubjectKind::Repository => Subject::Repository(RepositorySubject::new(options.path)),
        })
    }

    /// Kind of this subject
    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Extension(_) => SubjectKind::Extension,
            Subject::Package(_) => SubjectKind::Package,
            Subject::Repository(_) => SubjectKind::Repository,
        }
    }

    /// Whether this is a package subject in monorepo mode
    pub fn is_monorepo(&self) -> bool {
        matches!(self, Subject::Package(p) if p.is_monorepo())
    }

    /// Locate the subject on disk
    pub async fn select_target(&self, ctx: SubjectContext<'_>) -> Result<SubjectInfo> {
        match self {
            Subject::Extension(s) => s.select_target(ctx).await,
            Subject::Package(s) => s.select_target(ctx).await,
            Subject::Repository(s) => s.select_target(ctx).await,
        }
    }

    /// Name, repository and current version of the selected subject
    pub async fn metadata(&self, ctx: SubjectContext<'_>) -> Result<SubjectMetadata> {
        match self {
            Subject::Extension(s) => s.metadata(ctx).await,
            Subject::Package(s) => s.metadata(ctx).await,
            Subject::Repository(s) => s.metadata(ctx).await,
        }
    }

    /// Build tasks to run, in order
    pub async fn build_tasks(&self, ctx: SubjectContext<'_>) -> Result<Vec<BuildTask>> {
        match self {
            Subject::Extension(s) => Ok(s.build_tasks()),
            Subject::Package(s) => s.build_tasks(ctx).await,
            Subject::Repository(_) => Ok(Vec::new()),
        }
    }

    /// Run a single build task
    pub async fn run_build_task(&self, ctx: SubjectContext<'_>, task: BuildTask) -> Result<()> {
        let root = ctx.root()?;
        let pm = &ctx.tools.package_manager;
        match task {
            BuildTask::Install => pm.install(root).await,
            BuildTask::Build | BuildTask::BundleAssets => pm.build(root).await,
            BuildTask::Translations => pm.run_script(root, "translations").await,
        }
    }

    /// Persist `version` in the subject
    pub async fn update_version(&self, ctx: SubjectContext<'_>, version: &Version) -> Result<()> {
        match self {
            Subject::Package(s) => s.update_version(ctx, version).await,
            Subject::Extension(_) | Subject::Repository(_) => {
                log::debug!("{} subjects keep no version to update", self.kind());
                Ok(())
            }
        }
    }

    /// Publish the released artifact
    pub async fn publish(&self, ctx: SubjectContext<'_>) -> Result<()> {
        match self {
            Subject::Package(s) => s.publish(ctx).await,
            Subject::Extension(_) | Subject::Repository(_) => {
                log::debug!("{} subjects have nothing to publish", self.kind());
                Ok(())
            }
        }
    }

    fn monorepo(&self) -> Result<&PackageSubject> {
        match self {
            Subject::Package(p) if p.is_monorepo() => Ok(p),
            _ => Err(CliError::InvalidArguments {
                reason: format!("monorepo operations are not available for a {} release", self.kind()),
            }
            .into()),
        }
    }

    /// Members of the monorepo
    pub async fn monorepo_packages(&self, ctx: SubjectContext<'_>) -> Result<Vec<MonorepoMember>> {
        self.monorepo()?.monorepo_packages(ctx).await
    }

    /// Write planned versions into every member and the root descriptor
    pub async fn monorepo_update_versions(
        &self,
        ctx: SubjectContext<'_>,
        packages: &[MonorepoPackage],
        root_version: &Version,
    ) -> Result<()> {
        self.monorepo()?
            .monorepo_update_versions(ctx, packages, root_version)
            .await
    }

    /// Publish changed members in dependency order
    pub async fn monorepo_publish(&self, ctx: SubjectContext<'_>, packages: &[MonorepoPackage]) -> Result<()> {
        self.monorepo()?.monorepo_publish(ctx, packages).await
    }
}
