//! Run state for a single release.
//!
//! The state lives in memory for one process invocation and is populated
//! additively by the release steps. Set-once fields are guarded by their
//! accessors so a misordered driver fails with a [`StateError`] instead of
//! silently overwriting a computed value.
//!
//! [`StateError`]: crate::error::StateError

mod release_state;

pub use release_state::{
    MonorepoPackage, PullRequest, ReleasePhase, RunState, SubjectInfo, releasing_branch_name,
};
