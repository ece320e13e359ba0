//! Operation: delete a downloaded package and forget its lock.

use std::path::Path;
use std::sync::Arc;

use gitdeps_core::config::GlobalConfig;
use gitdeps_core::lockfile::{Lockfile, LOCKFILE_NAME};
use gitdeps_core::manifest::{ChainLoader, ManifestLoader};
use gitdeps_core::package::PackageInfo;
use gitdeps_core::repository::Repository;
use gitdeps_resolver::Resolver;

/// Remove the package cloned from `source`.
///
/// The storage location honours a `package` override declared for `source`
/// in the project manifest. Returns whether a download was deleted.
pub fn remove(
    project_root: &Path,
    config: &GlobalConfig,
    git: Arc<dyn Repository>,
    source: &str,
) -> miette::Result<bool> {
    let loader = Arc::new(ChainLoader::default());
    let declared = loader
        .load_from_directory(project_root)
        .and_then(|m| m.dependencies.into_iter().find(|p| p.source == source));
    let pkg = match declared {
        Some(pkg) => pkg,
        None => PackageInfo::new(source, None)?,
    };

    let resolver = Resolver::new(config.install_root(project_root), git, loader);
    let removed = resolver.remove_download(&pkg)?;

    let lockfile_path = project_root.join(LOCKFILE_NAME);
    if lockfile_path.is_file() {
        let mut lockfile = Lockfile::from_path(&lockfile_path)?;
        let before = lockfile.package.len();
        lockfile.package.retain(|p| p.source != source);
        if lockfile.package.len() != before {
            lockfile.write_to(&lockfile_path)?;
        }
    }

    Ok(removed)
}
