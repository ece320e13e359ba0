//! Operation: resolve and download all dependencies, then write the lockfile.

use std::path::Path;
use std::sync::Arc;

use gitdeps_core::config::GlobalConfig;
use gitdeps_core::lockfile::{LockedPackage, Lockfile, VersionLocks, LOCKFILE_NAME};
use gitdeps_core::manifest::ChainLoader;
use gitdeps_core::repository::Repository;
use gitdeps_resolver::Resolver;
use gitdeps_util::errors::GitdepsError;
use gitdeps_util::progress::{spinner, status, status_info};

/// Options for `gitdeps fetch`.
#[derive(Debug, Default)]
pub struct FetchOptions {
    /// Ignore `Gitdeps.lock` and pick revisions from the constraints alone.
    pub update: bool,
}

/// Fetch every production dependency of the project at `project_root`
/// and record the resulting revisions in `Gitdeps.lock`.
///
/// Returns the locked packages in lockfile order.
pub async fn fetch(
    project_root: &Path,
    config: &GlobalConfig,
    git: Arc<dyn Repository>,
    opts: &FetchOptions,
) -> miette::Result<Vec<LockedPackage>> {
    let manifest = crate::load_root_manifest(project_root)?;

    if !git.is_usable() {
        return Err(GitdepsError::Config {
            message: format!(
                "`{}` is not usable; install git or set [git] program in {}",
                config.git.program,
                GlobalConfig::default_path().display()
            ),
        }
        .into());
    }

    let lockfile_path = project_root.join(LOCKFILE_NAME);
    let locks = if opts.update {
        status_info("Updating", "ignoring pinned revisions");
        VersionLocks::new()
    } else if lockfile_path.is_file() {
        Lockfile::from_path(&lockfile_path)?.locks()
    } else {
        VersionLocks::new()
    };
    tracing::debug!("Using {} locked revisions", locks.len());

    let install_root = config.install_root(project_root);
    let resolver = Resolver::new(&install_root, git, Arc::new(ChainLoader::default()));

    let sp = spinner("Resolving dependencies...");
    let result = resolver.resolve(Some(manifest), Arc::new(locks)).await;
    sp.finish_and_clear();
    result?;

    let lockfile = Lockfile::generate(resolver.resolved_packages());
    lockfile.write_to(&lockfile_path)?;

    status(
        "Fetched",
        &format!(
            "{} package{} into {}",
            lockfile.package.len(),
            if lockfile.package.len() == 1 { "" } else { "s" },
            install_root.display()
        ),
    );
    Ok(lockfile.package)
}
