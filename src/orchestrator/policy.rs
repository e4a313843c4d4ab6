//! What a failed build task does to the run.

use crate::subject::BuildTask;

/// Reaction to a failed build task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Warn and keep releasing
    LogAndContinue,
    /// Stop the run with the error
    Propagate,
}

/// Policy for `task`; asset bundling and translations are best-effort
pub fn failure_policy(task: BuildTask) -> FailurePolicy {
    match task {
        BuildTask::BundleAssets | BuildTask::Translations => FailurePolicy::LogAndContinue,
        BuildTask::Install | BuildTask::Build => FailurePolicy::Propagate,
    }
}
