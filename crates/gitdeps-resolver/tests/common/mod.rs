//! In-memory stand-in for git.
//!
//! A "clone" writes the remote's files plus a `.fakegit/` directory holding
//! the remote URL and the checked-out revision, so copying a checkout around
//! carries its state with it.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gitdeps_core::repository::Repository;
use gitdeps_util::errors::GitdepsError;

const STATE_DIR: &str = ".fakegit";

#[derive(Debug, Clone, Default)]
pub struct FakeRemote {
    /// Newest first.
    commits: Vec<String>,
    tags: Vec<(String, String)>,
    branches: BTreeMap<String, Vec<String>>,
    files: Vec<(String, String)>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit on top of `main`.
    pub fn commit(mut self, id: &str) -> Self {
        self.commits.insert(0, id.to_string());
        self.branches
            .entry("main".to_string())
            .or_default()
            .insert(0, id.to_string());
        self
    }

    pub fn tag(mut self, name: &str, commit: &str) -> Self {
        self.tags.push((name.to_string(), commit.to_string()));
        self
    }

    pub fn file(mut self, name: &str, content: &str) -> Self {
        self.files.push((name.to_string(), content.to_string()));
        self
    }

    fn head(&self) -> Option<&String> {
        self.commits.first()
    }

    fn resolve(&self, rev: &str) -> Option<String> {
        if self.commits.iter().any(|c| c == rev) {
            return Some(rev.to_string());
        }
        if let Some((_, commit)) = self.tags.iter().find(|(t, _)| t == rev) {
            return Some(commit.clone());
        }
        self.branches.get(rev).and_then(|b| b.first()).cloned()
    }
}

#[derive(Default)]
pub struct FakeGit {
    remotes: HashMap<String, FakeRemote>,
    clone_delay: Option<Duration>,
    clones: AtomicUsize,
    fetches: AtomicUsize,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote(mut self, url: &str, remote: FakeRemote) -> Self {
        self.remotes.insert(url.to_string(), remote);
        self
    }

    /// Make every clone take at least `delay`.
    pub fn slow_clones(mut self, delay: Duration) -> Self {
        self.clone_delay = Some(delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn clone_count(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn fail(&self, command: &str, message: impl Into<String>) -> GitdepsError {
        GitdepsError::Execution {
            command: format!("git {command}"),
            message: message.into(),
        }
    }

    fn remote_of(&self, path: &Path) -> Result<&FakeRemote, GitdepsError> {
        let url = std::fs::read_to_string(path.join(STATE_DIR).join("url"))
            .map_err(|_| self.fail("status", "not a git repository"))?;
        self.remotes
            .get(url.trim())
            .ok_or_else(|| self.fail("status", format!("unknown remote {url}")))
    }

    fn write_head(&self, path: &Path, rev: &str) -> Result<(), GitdepsError> {
        std::fs::write(path.join(STATE_DIR).join("HEAD"), rev)?;
        Ok(())
    }
}

impl Repository for FakeGit {
    fn is_usable(&self) -> bool {
        true
    }

    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitdepsError> {
        self.clones.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.clone_delay {
            std::thread::sleep(delay);
        }
        let remote = self
            .remotes
            .get(url)
            .ok_or_else(|| self.fail("clone", format!("repository '{url}' not found")))?;

        if dest.exists() {
            std::fs::remove_dir_all(dest)?;
        }
        std::fs::create_dir_all(dest.join(STATE_DIR))?;
        for (name, content) in &remote.files {
            std::fs::write(dest.join(name), content)?;
        }
        std::fs::write(dest.join(STATE_DIR).join("url"), url)?;
        let head = remote
            .head()
            .ok_or_else(|| self.fail("clone", "empty repository"))?;
        self.write_head(dest, head)
    }

    fn checkout(&self, path: &Path, rev: &str) -> Result<(), GitdepsError> {
        let commit = self
            .remote_of(path)?
            .resolve(rev)
            .ok_or_else(|| self.fail("checkout", format!("pathspec '{rev}' did not match")))?;
        self.write_head(path, &commit)
    }

    fn fetch_all(&self, path: &Path) -> Result<(), GitdepsError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.remote_of(path).map(|_| ())
    }

    fn pull_default(&self, path: &Path) -> Result<(), GitdepsError> {
        self.remote_of(path).map(|_| ())
    }

    fn pull_tags(&self, path: &Path) -> Result<(), GitdepsError> {
        self.remote_of(path).map(|_| ())
    }

    fn list_commits(&self, path: &Path) -> Result<Vec<String>, GitdepsError> {
        Ok(self.remote_of(path)?.commits.clone())
    }

    fn list_branches(&self, path: &Path) -> Result<Vec<String>, GitdepsError> {
        Ok(self.remote_of(path)?.branches.keys().cloned().collect())
    }

    fn list_tags(&self, path: &Path) -> Result<Vec<String>, GitdepsError> {
        Ok(self
            .remote_of(path)?
            .tags
            .iter()
            .map(|(t, _)| t.clone())
            .collect())
    }

    fn current_revision(&self, path: &Path) -> Result<String, GitdepsError> {
        let head = std::fs::read_to_string(path.join(STATE_DIR).join("HEAD"))
            .map_err(|_| self.fail("rev-parse HEAD", "not a git repository"))?;
        Ok(head.trim().to_string())
    }

    fn tags_pointing_at(&self, path: &Path, rev: &str) -> Result<Vec<String>, GitdepsError> {
        Ok(self
            .remote_of(path)?
            .tags
            .iter()
            .filter(|(_, c)| c == rev)
            .map(|(t, _)| t.clone())
            .collect())
    }

    fn revisions_for_tag(&self, path: &Path, tag: &str) -> Result<Vec<String>, GitdepsError> {
        Ok(self
            .remote_of(path)?
            .tags
            .iter()
            .filter(|(t, _)| t == tag)
            .map(|(_, c)| c.clone())
            .collect())
    }

    fn revisions_in_branch(
        &self,
        path: &Path,
        branch: &str,
    ) -> Result<Vec<String>, GitdepsError> {
        Ok(self
            .remote_of(path)?
            .branches
            .get(branch)
            .cloned()
            .unwrap_or_default())
    }
}

pub const WIDGETS: &str = "https://github.com/acme/widgets.git";
pub const GEARS: &str = "https://github.com/acme/gears.git";
pub const BOLTS: &str = "https://github.com/acme/bolts.git";
pub const UTIL: &str = "https://github.com/acme/util.git";
pub const TESTKIT: &str = "https://github.com/acme/testkit.git";

/// Three releases: 1.0.0 (w100), 1.5.0 (w150), 2.0.0 (w200, head).
pub fn widgets() -> FakeRemote {
    FakeRemote::new()
        .commit("w100")
        .commit("w150")
        .commit("w200")
        .tag("1.0.0", "w100")
        .tag("1.5.0", "w150")
        .tag("2.0.0", "w200")
        .file("README.md", "widgets")
}

/// Two releases: 1.0.0 (u100) and 2.0.0 (u200, head).
pub fn util() -> FakeRemote {
    FakeRemote::new()
        .commit("u100")
        .commit("u200")
        .tag("1.0.0", "u100")
        .tag("2.0.0", "u200")
}
