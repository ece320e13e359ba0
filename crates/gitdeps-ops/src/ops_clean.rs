//! Operation: remove every downloaded package of a project.

use std::path::Path;

use gitdeps_core::config::GlobalConfig;
use gitdeps_util::errors::GitdepsError;

/// Delete the project's install root.
pub fn clean(project_root: &Path, config: &GlobalConfig) -> miette::Result<CleanResult> {
    let install_root = config.install_root(project_root);
    if !install_root.exists() {
        return Ok(CleanResult::NothingToClean);
    }
    let freed = gitdeps_util::fs::dir_size(&install_root);
    gitdeps_util::fs::remove_dir_all_force(&install_root).map_err(GitdepsError::Io)?;
    Ok(CleanResult::Cleaned { freed })
}

/// Result of a clean operation.
#[derive(Debug, PartialEq, Eq)]
pub enum CleanResult {
    Cleaned { freed: u64 },
    NothingToClean,
}
