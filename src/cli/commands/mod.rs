//! Command execution: wiring collaborators, running a flow and mapping the outcome to an exit code.

mod flows;

pub use flows::{EXTENSION_FLOW, LEGACY_FLOW, MONOREPO_FLOW, PACKAGE_FLOW};

use crate::cli::{Args, Command, OutputManager};
use crate::config::{EnvConfig, JsonConfigStore};
use crate::error::{ReleaseError, Result};
use crate::git::GitCli;
use crate::github::{GitHubConnector, GitHubReleaseConfig};
use crate::orchestrator::{ReleaseOrchestrator, Step};
use crate::package::Npm;
use crate::prompt::TerminalPrompter;
use crate::subject::Subject;
use crate::toolbox::Toolbox;
use crate::version::ConventionalRecommender;
use std::sync::Arc;

/// Steps run by `command`
pub fn flow_for(command: &Command) -> &'static [Step] {
    match command {
        Command::Extension { .. } => EXTENSION_FLOW,
        Command::Package { .. } => PACKAGE_FLOW,
        Command::Monorepo { .. } => MONOREPO_FLOW,
        Command::Legacy { .. } => LEGACY_FLOW,
    }
}

/// Collaborators backed by git, npm, GitHub and the terminal
pub fn production_toolbox(remote: &str) -> Result<Toolbox> {
    let git = Arc::new(GitCli::new(remote)?);
    Ok(Toolbox {
        recommender: Arc::new(ConventionalRecommender::new(git.clone())),
        git,
        package_manager: Arc::new(Npm::new()),
        prompter: Arc::new(TerminalPrompter::new()),
        hosting: Arc::new(GitHubConnector::new(GitHubReleaseConfig::default())),
        config_store: Arc::new(JsonConfigStore::default_location()?),
        env: EnvConfig::from_env(),
        output: OutputManager::default(),
    })
}

/// Print the outcome of a failed run and return its exit code
pub fn report_failure(command: &str, error: &ReleaseError, output: &OutputManager) -> i32 {
    let code = error.exit_code();
    match error.termination() {
        Some(termination) if code == 0 => output.warn(&termination.message),
        Some(termination) => output.error(&termination.message),
        None => output.error(&format!("Command '{command}' failed: {error}")),
    }

    if code != 0 {
        let suggestions = error.recovery_suggestions();
        if !suggestions.is_empty() {
            output.println("\n💡 Recovery suggestions:");
            for suggestion in suggestions {
                output.indent(&suggestion);
            }
        }
    }
    code
}

/// Run the flow selected by `args` and return the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    let command = args.command;
    let params = command.params();
    let subject = Subject::new(command.subject_kind(), command.subject_options())?;
    let tools = production_toolbox(&params.remote)?;
    let output = tools.output.clone();

    let mut orchestrator = ReleaseOrchestrator::new(params, subject, tools);
    match orchestrator.run(flow_for(&command)).await {
        Ok(()) => {
            output.success("Release complete");
            Ok(0)
        }
        Err(e) => Ok(report_failure(command.name(), &e, &output)),
    }
}
