//! Package manager capability and its npm implementation.

mod descriptor;
mod graph;
mod npm;

pub use descriptor::{DEPENDENCY_SECTIONS, DESCRIPTOR_FILE, PackageDescriptor, rewrite_range};
pub use graph::publish_order;
pub use npm::Npm;

use crate::error::Result;
use async_trait::async_trait;
use semver::Version;
use std::path::{Path, PathBuf};

/// A package inside a monorepo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonorepoMember {
    /// Package name
    pub name: String,
    /// Directory relative to the monorepo root
    pub path: PathBuf,
    /// Version currently in its descriptor
    pub version: Version,
    /// Names of sibling packages it depends on
    pub dependencies: Vec<String>,
    /// `private: true` packages are never published
    pub private: bool,
}

/// Package-manager operations needed for a release.
///
/// `root` is always the directory holding the descriptor to act on.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Install dependencies
    async fn install(&self, root: &Path) -> Result<()>;

    /// Run the `build` script
    async fn build(&self, root: &Path) -> Result<()> {
        self.run_script(root, "build").await
    }

    /// Run an arbitrary script from the descriptor
    async fn run_script(&self, root: &Path, script: &str) -> Result<()>;

    /// Publish the package in `root`
    async fn publish(&self, root: &Path, registry: Option<&str>) -> Result<()>;

    /// Read `root/package.json`
    async fn read_descriptor(&self, root: &Path) -> Result<PackageDescriptor>;

    /// Write a descriptor back to its own path
    async fn write_descriptor(&self, descriptor: &PackageDescriptor) -> Result<()>;

    /// Persist `version` in `root/package.json` and its lock file
    async fn update_version(&self, root: &Path, version: &Version) -> Result<()>;

    /// Regenerate the lock file without touching `node_modules`
    async fn refresh_lock_file(&self, root: &Path) -> Result<()>;

    /// Members declared by the monorepo in `root`
    async fn list_monorepo_members(&self, root: &Path) -> Result<Vec<MonorepoMember>>;

    /// Publish `members` in the given order
    async fn publish_all(&self, root: &Path, members: &[MonorepoMember], registry: Option<&str>) -> Result<()> {
        for member in members {
            log::info!("Publishing {}@{}", member.name, member.version);
            self.publish(&root.join(&member.path), registry).await?;
        }
        Ok(())
    }
}
