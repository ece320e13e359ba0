//! The version-control capability consumed by constraints and the resolver.

use std::path::Path;

use gitdeps_util::errors::GitdepsError;

/// Facts about, and actions on, local repository checkouts.
///
/// Every method works on the repository at `path` as it is on disk at call
/// time. Listing methods return the tool's order. Tool failures surface as
/// [`GitdepsError::Execution`].
pub trait Repository: Send + Sync {
    /// Whether the underlying tool can be run at all.
    fn is_usable(&self) -> bool;

    /// Clone `url` into `dest`, clearing any previous contents of `dest`.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitdepsError>;

    /// Check out a revision, tag or branch.
    fn checkout(&self, path: &Path, rev: &str) -> Result<(), GitdepsError>;

    fn fetch_all(&self, path: &Path) -> Result<(), GitdepsError>;

    fn pull_default(&self, path: &Path) -> Result<(), GitdepsError>;

    fn pull_tags(&self, path: &Path) -> Result<(), GitdepsError>;

    /// Every commit reachable from any ref.
    fn list_commits(&self, path: &Path) -> Result<Vec<String>, GitdepsError>;

    fn list_branches(&self, path: &Path) -> Result<Vec<String>, GitdepsError>;

    fn list_tags(&self, path: &Path) -> Result<Vec<String>, GitdepsError>;

    /// The commit currently checked out.
    fn current_revision(&self, path: &Path) -> Result<String, GitdepsError>;

    fn tags_pointing_at(&self, path: &Path, rev: &str) -> Result<Vec<String>, GitdepsError>;

    /// Commits a tag resolves to; empty when the tag does not exist.
    fn revisions_for_tag(&self, path: &Path, tag: &str) -> Result<Vec<String>, GitdepsError>;

    /// Commits reachable from a branch, newest first; empty when the branch
    /// does not exist.
    fn revisions_in_branch(&self, path: &Path, branch: &str)
        -> Result<Vec<String>, GitdepsError>;
}
