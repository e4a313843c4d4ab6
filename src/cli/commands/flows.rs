//! Step sequences run by each subcommand.

use crate::orchestrator::Step;

/// Extension release through a pull request
pub const EXTENSION_FLOW: &[Step] = &[
    Step::SelectTarget,
    Step::InitialiseGitClient,
    Step::VerifyLocalChanges,
    Step::SignTags,
    Step::VerifyBranches,
    Step::InitialiseGithubClient,
    Step::VerifyCredentials,
    Step::PruneRemoteOrigin,
    Step::ExtractVersion,
    Step::DoesTagExists,
    Step::DoesReleasingBranchExists,
    Step::IsReleaseRequired,
    Step::ConfirmRelease,
    Step::CreateReleasingBranch,
    Step::Build,
    Step::UpdateVersion,
    Step::CreatePullRequest,
    Step::ExtractReleaseNotes,
    Step::MergePullRequest,
    Step::CreateReleaseTag,
    Step::CreateGithubRelease,
    Step::MergeBack,
    Step::RemoveReleasingBranch,
];

/// npm package release through a pull request
pub const PACKAGE_FLOW: &[Step] = &[
    Step::SelectTarget,
    Step::InitialiseGitClient,
    Step::VerifyLocalChanges,
    Step::SignTags,
    Step::VerifyBranches,
    Step::InitialiseGithubClient,
    Step::VerifyCredentials,
    Step::PruneRemoteOrigin,
    Step::ExtractVersion,
    Step::DoesTagExists,
    Step::DoesReleasingBranchExists,
    Step::IsReleaseRequired,
    Step::ConfirmRelease,
    Step::CreateReleasingBranch,
    Step::Build,
    Step::UpdateVersion,
    Step::CreatePullRequest,
    Step::ExtractReleaseNotes,
    Step::MergePullRequest,
    Step::CreateReleaseTag,
    Step::CreateGithubRelease,
    Step::MergeBack,
    Step::RemoveReleasingBranch,
    Step::Publish,
];

/// npm workspace release; members are planned after the root version
pub const MONOREPO_FLOW: &[Step] = &[
    Step::SelectTarget,
    Step::InitialiseGitClient,
    Step::VerifyLocalChanges,
    Step::SignTags,
    Step::VerifyBranches,
    Step::InitialiseGithubClient,
    Step::VerifyCredentials,
    Step::PruneRemoteOrigin,
    Step::ExtractVersion,
    Step::ExtractMonorepoVersions,
    Step::DoesTagExists,
    Step::DoesReleasingBranchExists,
    Step::IsReleaseRequired,
    Step::ConfirmRelease,
    Step::CreateReleasingBranch,
    Step::Build,
    Step::UpdateVersion,
    Step::CreatePullRequest,
    Step::ExtractReleaseNotes,
    Step::MergePullRequest,
    Step::CreateReleaseTag,
    Step::CreateGithubRelease,
    Step::MergeBack,
    Step::RemoveReleasingBranch,
    Step::Publish,
];

/// Direct merge into the release branch, no pull request
pub const LEGACY_FLOW: &[Step] = &[
    Step::SelectTarget,
    Step::InitialiseGitClient,
    Step::VerifyLocalChanges,
    Step::SignTags,
    Step::VerifyBranches,
    Step::PruneRemoteOrigin,
    Step::ExtractVersion,
    Step::DoesTagExists,
    Step::DoesReleasingBranchExists,
    Step::IsReleaseRequired,
    Step::ConfirmRelease,
    Step::CreateReleasingBranch,
    Step::Build,
    Step::UpdateVersion,
    Step::MergeWithReleaseBranch,
    Step::CreateReleaseTag,
    Step::InitialiseGithubClient,
    Step::VerifyCredentials,
    Step::CreateGithubRelease,
    Step::MergeBack,
    Step::RemoveReleasingBranch,
    Step::Publish,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn position(flow: &[Step], step: Step) -> usize {
        flow.iter().position(|s| *s == step).unwrap()
    }

    #[test]
    fn test_version_known_before_tag_and_branch_checks() {
        for flow in [EXTENSION_FLOW, PACKAGE_FLOW, MONOREPO_FLOW, LEGACY_FLOW] {
            let extract = position(flow, Step::ExtractVersion);
            assert!(extract < position(flow, Step::DoesTagExists));
            assert!(extract < position(flow, Step::CreateReleasingBranch));
            assert_eq!(flow[0], Step::SelectTarget);
        }
    }

    #[test]
    fn test_only_legacy_merges_without_pull_request() {
        assert!(LEGACY_FLOW.contains(&Step::MergeWithReleaseBranch));
        assert!(!LEGACY_FLOW.contains(&Step::CreatePullRequest));
        for flow in [EXTENSION_FLOW, PACKAGE_FLOW, MONOREPO_FLOW] {
            assert!(!flow.contains(&Step::MergeWithReleaseBranch));
            assert!(position(flow, Step::CreatePullRequest) < position(flow, Step::MergePullRequest));
        }
    }

    #[test]
    fn test_extensions_are_never_published() {
        assert!(!EXTENSION_FLOW.contains(&Step::Publish));
        assert!(MONOREPO_FLOW.contains(&Step::ExtractMonorepoVersions));
    }
}
