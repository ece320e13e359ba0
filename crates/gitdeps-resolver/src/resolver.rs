//! Concurrent, recursive resolution of a manifest's dependency tree.
//!
//! Each production dependency becomes its own task. A task downloads the
//! package on the blocking pool and, when the package was fetched for the
//! first time, resolves the manifest found inside it with the same locks.
//! Packages already on disk are only checked against their constraint, which
//! is how a package shared by two dependents gets validated against both.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt};
use gitdeps_core::lockfile::{LockedPackage, VersionLocks};
use gitdeps_core::manifest::{Manifest, ManifestLoader};
use gitdeps_core::package::PackageInfo;
use gitdeps_core::repository::Repository;
use gitdeps_util::errors::GitdepsError;
use tokio::task::JoinSet;

use crate::in_flight::{lock, InFlight};

/// Downloads packages below an install root and resolves manifests.
///
/// Cloning is cheap; clones share the filesystem lock, the in-flight slots
/// and the record of resolved packages.
#[derive(Clone)]
pub struct Resolver {
    install_root: PathBuf,
    git: Arc<dyn Repository>,
    loader: Arc<dyn ManifestLoader>,
    /// Held for every copy, rename or delete below the install root.
    fs_lock: Arc<Mutex<()>>,
    in_flight: InFlight,
    resolved: Arc<Mutex<BTreeMap<String, LockedPackage>>>,
}

impl Resolver {
    pub fn new(
        install_root: impl Into<PathBuf>,
        git: Arc<dyn Repository>,
        loader: Arc<dyn ManifestLoader>,
    ) -> Self {
        Self {
            install_root: install_root.into(),
            git,
            loader,
            fs_lock: Arc::new(Mutex::new(())),
            in_flight: InFlight::new(),
            resolved: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// `<install root>/<host>/<package>`.
    pub fn storage_path(&self, pkg: &PackageInfo) -> PathBuf {
        pkg.install_path(&self.install_root)
    }

    /// [`storage_path`](Self::storage_path), refusing anything that does not
    /// resolve to a directory strictly below the install root.
    fn checked_storage_path(&self, pkg: &PackageInfo) -> Result<PathBuf, GitdepsError> {
        let storage = self.storage_path(pkg);
        let below_root = storage
            .strip_prefix(&self.install_root)
            .map(|rel| {
                rel.components().next().is_some()
                    && rel.components().all(|c| matches!(c, Component::Normal(_)))
            })
            .unwrap_or(false);
        if !below_root {
            return Err(GitdepsError::Manifest {
                message: format!(
                    "Storage path {} for {pkg} is outside {}",
                    storage.display(),
                    self.install_root.display()
                ),
            });
        }
        Ok(storage)
    }

    pub fn is_downloaded(&self, pkg: &PackageInfo) -> bool {
        self.storage_path(pkg).is_dir()
    }

    /// Delete a package's storage directory. Returns whether anything was removed.
    pub fn remove_download(&self, pkg: &PackageInfo) -> Result<bool, GitdepsError> {
        let storage = self.checked_storage_path(pkg)?;
        let slot = self.in_flight.slot(&storage);
        let _serial = lock(&slot);
        let _fs = lock(&self.fs_lock);

        if !storage.exists() {
            return Ok(false);
        }
        gitdeps_util::fs::remove_dir_all_force(&storage)?;
        prune_empty_parents(&storage, &self.install_root);
        lock(&self.resolved).remove(&pkg.source);
        tracing::info!("Removed {pkg}");
        Ok(true)
    }

    /// Every package fetched or checked so far with its checked-out revision,
    /// sorted by source.
    pub fn resolved_packages(&self) -> Vec<LockedPackage> {
        lock(&self.resolved).values().cloned().collect()
    }

    /// Resolve every production dependency of `manifest`, recursively.
    ///
    /// All dependencies are processed concurrently. The call returns once
    /// every task has finished; if any failed, the first failure observed
    /// is returned. A `None` manifest resolves to nothing.
    pub fn resolve(
        &self,
        manifest: Option<Manifest>,
        locks: Arc<VersionLocks>,
    ) -> BoxFuture<'static, Result<(), GitdepsError>> {
        let this = self.clone();
        async move {
            let Some(manifest) = manifest else {
                return Ok(());
            };

            let mut tasks = JoinSet::new();
            for pkg in manifest.dependencies {
                let this = this.clone();
                let locks = Arc::clone(&locks);
                tasks.spawn(async move { this.resolve_package(pkg, locks).await });
            }

            let mut first_error = None;
            while let Some(joined) = tasks.join_next().await {
                let result = joined.unwrap_or_else(|e| {
                    Err(GitdepsError::Generic {
                        message: format!("Resolution task failed: {e}"),
                    })
                });
                if let Err(e) = result {
                    if first_error.is_none() {
                        first_error = Some(e);
                    } else {
                        tracing::debug!("Additional resolution failure: {e}");
                    }
                }
            }
            first_error.map_or(Ok(()), Err)
        }
        .boxed()
    }

    async fn resolve_package(
        self,
        pkg: PackageInfo,
        locks: Arc<VersionLocks>,
    ) -> Result<(), GitdepsError> {
        let lock = locks.get(&pkg.source).map(str::to_string);
        let this = self.clone();
        let fetched = tokio::task::spawn_blocking(move || {
            let Some(path) = this.download(&pkg, lock.as_deref())? else {
                return Ok(None);
            };
            Ok::<_, GitdepsError>(Some(this.loader.load_from_directory(&path)))
        })
        .await
        .map_err(|e| GitdepsError::Generic {
            message: format!("Download task failed: {e}"),
        })??;

        match fetched {
            Some(manifest) => self.resolve(manifest, locks).await,
            None => Ok(()),
        }
    }

    /// Make `pkg` available at its storage path. Blocking.
    ///
    /// A package not yet on disk is cloned into a scratch directory and
    /// checked out at `lock` when given, otherwise at the first revision its
    /// constraint accepts; the checkout is then moved into place and its path
    /// returned.
    ///
    /// A package already on disk is moved to `lock` when that differs from
    /// its current revision, then checked against its constraint. Returns
    /// `None` in that case, since its dependencies were handled by whoever
    /// fetched it.
    pub fn download(
        &self,
        pkg: &PackageInfo,
        lock: Option<&str>,
    ) -> Result<Option<PathBuf>, GitdepsError> {
        let storage = self.checked_storage_path(pkg)?;
        let slot = self.in_flight.slot(&storage);
        let _serial = self::lock(&slot);

        if storage.is_dir() {
            self.verify_cached(pkg, &storage, lock)?;
            return Ok(None);
        }

        self.fetch(pkg, &storage, lock)?;
        Ok(Some(storage))
    }

    fn fetch(
        &self,
        pkg: &PackageInfo,
        storage: &Path,
        lock: Option<&str>,
    ) -> Result<(), GitdepsError> {
        tracing::info!("Fetching {pkg} from {}", pkg.source);
        let scratch = tempfile::Builder::new().prefix("gitdeps-clone-").tempdir()?;
        let checkout = scratch.path().join("repo");
        self.git.clone_repo(&pkg.source, &checkout)?;

        if let Some(rev) = lock {
            tracing::debug!("{pkg} is locked at {rev}");
            self.git.checkout(&checkout, rev)?;
        } else if let Some(constraint) = &pkg.constraint {
            let accepted = constraint.satisfying(self.git.as_ref(), &checkout)?;
            let Some(rev) = accepted.first() else {
                return Err(GitdepsError::ConstraintUnsatisfiable {
                    package: pkg.to_string(),
                    constraint: constraint.to_string(),
                });
            };
            tracing::debug!("{pkg}: '{constraint}' selects {rev}");
            self.git.checkout(&checkout, rev)?;
        }

        let revision = self.git.current_revision(&checkout)?;
        self.promote(&checkout, storage)?;
        self.record(pkg, revision);
        Ok(())
    }

    fn verify_cached(
        &self,
        pkg: &PackageInfo,
        storage: &Path,
        lock: Option<&str>,
    ) -> Result<(), GitdepsError> {
        let mut current = self.git.current_revision(storage)?;

        if let Some(rev) = lock.filter(|rev| *rev != current) {
            tracing::debug!("{pkg} is at {current}, moving to locked {rev}");
            if self.git.checkout(storage, rev).is_err() {
                self.git.fetch_all(storage)?;
                self.git.checkout(storage, rev)?;
            }
            current = self.git.current_revision(storage)?;
        }

        if let Some(constraint) = &pkg.constraint {
            let accepted = constraint.satisfying(self.git.as_ref(), storage)?;
            if !accepted.contains(&current) {
                return Err(GitdepsError::ConstraintConflict {
                    package: pkg.to_string(),
                    revision: current,
                    constraint: constraint.to_string(),
                });
            }
        }

        tracing::debug!("{pkg} already present at {current}");
        self.record(pkg, current);
        Ok(())
    }

    /// Move a finished checkout to `storage`: copy into a staging directory
    /// next to it, then rename, so `storage` is never seen half-written.
    fn promote(&self, checkout: &Path, storage: &Path) -> Result<(), GitdepsError> {
        let parent = storage.parent().ok_or_else(|| GitdepsError::Generic {
            message: format!("Storage path {} has no parent", storage.display()),
        })?;

        let _fs = lock(&self.fs_lock);
        gitdeps_util::fs::ensure_dir(parent)?;
        let staging = tempfile::Builder::new()
            .prefix(".gitdeps-")
            .tempdir_in(parent)?;
        gitdeps_util::fs::copy_dir_all(checkout, staging.path())?;
        gitdeps_util::fs::remove_dir_all_force(storage)?;
        std::fs::rename(staging.path(), storage)?;
        Ok(())
    }

    fn record(&self, pkg: &PackageInfo, revision: String) {
        let path = pkg.install_path(Path::new(""));
        lock(&self.resolved).insert(
            pkg.source.clone(),
            LockedPackage {
                source: pkg.source.clone(),
                revision,
                path: Some(path.to_string_lossy().replace('\\', "/")),
            },
        );
    }
}

/// Remove now-empty directories between `removed` and `root`.
fn prune_empty_parents(removed: &Path, root: &Path) {
    let mut current = removed.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        // Fails on a non-empty directory, which ends the walk.
        if std::fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}
