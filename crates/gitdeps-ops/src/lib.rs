pub mod ops_check;
pub mod ops_clean;
pub mod ops_fetch;
pub mod ops_remove;

use std::path::Path;

use gitdeps_core::manifest::{ChainLoader, Manifest, ManifestLoader};
use gitdeps_util::errors::GitdepsError;

/// Read the project's own manifest, failing loudly when it is missing or broken.
pub fn load_root_manifest(project_root: &Path) -> miette::Result<Manifest> {
    match ChainLoader::default().read(project_root)? {
        Some(manifest) => Ok(manifest),
        None => Err(GitdepsError::Manifest {
            message: format!(
                "No Gitdeps.toml, package.json or *.csproj found in {}",
                project_root.display()
            ),
        }
        .into()),
    }
}
