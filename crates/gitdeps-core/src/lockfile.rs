use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use gitdeps_util::errors::GitdepsError;

pub const LOCKFILE_NAME: &str = "Gitdeps.lock";

/// Deterministic lockfile recording the exact revision of every fetched package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub package: Vec<LockedPackage>,
}

/// A single locked dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    /// Repository location, exactly as declared in the manifest.
    pub source: String,
    pub revision: String,
    /// Storage location relative to the install root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Lockfile {
    /// Build a lockfile from resolved packages, sorted by source.
    pub fn generate(packages: impl IntoIterator<Item = LockedPackage>) -> Self {
        let mut package: Vec<LockedPackage> = packages.into_iter().collect();
        package.sort_by(|a, b| a.source.cmp(&b.source));
        package.dedup_by(|a, b| a.source == b.source);
        Self { package }
    }

    /// Load and parse a `Gitdeps.lock` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GitdepsError::Lockfile {
            message: format!("Failed to read lockfile: {e}"),
        })?;
        Self::parse(&content).map_err(Into::into)
    }

    pub fn parse(content: &str) -> Result<Self, GitdepsError> {
        let lockfile: Self = toml::from_str(content).map_err(|e| GitdepsError::Lockfile {
            message: format!("Failed to parse lockfile: {e}"),
        })?;
        if let Some(bad) = lockfile.package.iter().find(|p| p.revision.starts_with('-')) {
            return Err(GitdepsError::Lockfile {
                message: format!("Invalid revision '{}' for {}", bad.revision, bad.source),
            });
        }
        Ok(lockfile)
    }

    /// Serialize the lockfile to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        let content = self.to_string_pretty().map_err(|e| GitdepsError::Lockfile {
            message: format!("Failed to serialize lockfile: {e}"),
        })?;
        std::fs::write(path, content).map_err(|e| GitdepsError::Lockfile {
            message: format!("Failed to write {}: {e}", path.display()),
        })?;
        Ok(())
    }

    pub fn locks(&self) -> VersionLocks {
        VersionLocks::from_iter(
            self.package
                .iter()
                .map(|p| (p.source.clone(), p.revision.clone())),
        )
    }
}

/// Pinned revisions keyed by repository location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionLocks {
    revisions: HashMap<String, String>,
}

impl VersionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.revisions.get(source).map(String::as_str)
    }

    pub fn insert(&mut self, source: impl Into<String>, revision: impl Into<String>) {
        self.revisions.insert(source.into(), revision.into());
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}

impl FromIterator<(String, String)> for VersionLocks {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            revisions: iter.into_iter().collect(),
        }
    }
}
