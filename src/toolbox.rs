//! Collaborators a release run talks to.

use crate::cli::OutputManager;
use crate::config::{EnvConfig, UserConfigStore};
use crate::git::SourceControlClient;
use crate::github::HostingConnector;
use crate::package::PackageManager;
use crate::prompt::Prompter;
use crate::version::VersionRecommender;
use std::sync::Arc;

/// Every side-effecting capability used by the orchestrator and subjects.
///
/// Production wiring lives in the CLI; tests substitute in-memory fakes.
#[derive(Clone)]
pub struct Toolbox {
    /// Version control
    pub git: Arc<dyn SourceControlClient>,
    /// Next-version computation
    pub recommender: Arc<dyn VersionRecommender>,
    /// npm
    pub package_manager: Arc<dyn PackageManager>,
    /// Terminal questions
    pub prompter: Arc<dyn Prompter>,
    /// Builds the hosting client once a token is known
    pub hosting: Arc<dyn HostingConnector>,
    /// Persisted user config
    pub config_store: Arc<dyn UserConfigStore>,
    /// Environment snapshot
    pub env: EnvConfig,
    /// Operator-facing output
    pub output: OutputManager,
}
