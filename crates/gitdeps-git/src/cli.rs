use std::path::Path;

use gitdeps_core::repository::Repository;
use gitdeps_util::errors::GitdepsError;
use gitdeps_util::process::CommandBuilder;

/// Runs `git` as a child process for every repository operation.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    /// Use `program` as the git executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> CommandBuilder {
        // Never block on a credential prompt.
        CommandBuilder::new(&self.program).env("GIT_TERMINAL_PROMPT", "0")
    }

    fn git(&self, path: &Path) -> CommandBuilder {
        self.command().cwd(path)
    }

    /// Resolve `reference` to a commit, or `None` when it does not exist.
    fn resolve_ref(&self, path: &Path, reference: &str) -> Result<Option<String>, GitdepsError> {
        let cmd = self
            .git(path)
            .args(["rev-parse", "--verify", "--quiet"])
            .arg(format!("{reference}^{{commit}}"));
        let output = cmd.exec()?;
        if output.status.success() {
            let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();
            return Ok(Some(rev).filter(|r| !r.is_empty()));
        }
        // `--quiet` keeps stderr empty for a missing ref; anything else is a real failure.
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            Ok(None)
        } else {
            Err(GitdepsError::Execution {
                command: cmd.display(),
                message: stderr,
            })
        }
    }
}

impl Repository for GitCli {
    fn is_usable(&self) -> bool {
        match self.command().arg("--version").exec() {
            Ok(output) => output.status.success(),
            Err(e) => {
                tracing::debug!("git is not usable: {e}");
                false
            }
        }
    }

    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitdepsError> {
        if dest.exists() {
            gitdeps_util::fs::remove_dir_all_force(dest)?;
        }
        if let Some(parent) = dest.parent() {
            gitdeps_util::fs::ensure_dir(parent)?;
        }
        tracing::debug!("Cloning {url} into {}", dest.display());
        self.command()
            .args(["clone", "--quiet", "--", url])
            .arg(dest.to_string_lossy())
            .exec_checked()?;
        Ok(())
    }

    fn checkout(&self, path: &Path, rev: &str) -> Result<(), GitdepsError> {
        let rev = revision_arg(rev)?;
        tracing::debug!("Checking out {rev} in {}", path.display());
        self.git(path)
            .args(["checkout", "--quiet", rev])
            .exec_checked()?;
        Ok(())
    }

    fn fetch_all(&self, path: &Path) -> Result<(), GitdepsError> {
        self.git(path)
            .args(["fetch", "--all", "--quiet"])
            .exec_checked()?;
        Ok(())
    }

    fn pull_default(&self, path: &Path) -> Result<(), GitdepsError> {
        self.git(path).args(["pull", "--quiet"]).exec_checked()?;
        Ok(())
    }

    fn pull_tags(&self, path: &Path) -> Result<(), GitdepsError> {
        self.git(path)
            .args(["pull", "--tags", "--quiet"])
            .exec_checked()?;
        Ok(())
    }

    fn list_commits(&self, path: &Path) -> Result<Vec<String>, GitdepsError> {
        self.git(path)
            .args(["log", "--all", "--pretty=format:%H"])
            .exec_lines()
    }

    fn list_branches(&self, path: &Path) -> Result<Vec<String>, GitdepsError> {
        self.git(path)
            .args(["branch", "-a", "--format=%(refname:short)"])
            .exec_lines()
    }

    fn list_tags(&self, path: &Path) -> Result<Vec<String>, GitdepsError> {
        self.git(path).args(["tag", "-l"]).exec_lines()
    }

    fn current_revision(&self, path: &Path) -> Result<String, GitdepsError> {
        let cmd = self.git(path).args(["rev-parse", "HEAD"]);
        cmd.exec_lines()?
            .into_iter()
            .next()
            .ok_or_else(|| GitdepsError::Execution {
                command: cmd.display(),
                message: "no revision reported".to_string(),
            })
    }

    fn tags_pointing_at(&self, path: &Path, rev: &str) -> Result<Vec<String>, GitdepsError> {
        let rev = revision_arg(rev)?;
        self.git(path)
            .args(["tag", "--points-at", rev])
            .exec_lines()
    }

    fn revisions_for_tag(&self, path: &Path, tag: &str) -> Result<Vec<String>, GitdepsError> {
        Ok(self
            .resolve_ref(path, &format!("refs/tags/{tag}"))?
            .into_iter()
            .collect())
    }

    fn revisions_in_branch(
        &self,
        path: &Path,
        branch: &str,
    ) -> Result<Vec<String>, GitdepsError> {
        for reference in [
            format!("refs/heads/{branch}"),
            format!("refs/remotes/origin/{branch}"),
        ] {
            if self.resolve_ref(path, &reference)?.is_some() {
                return self.git(path).args(["rev-list", reference.as_str()]).exec_lines();
            }
        }
        Ok(Vec::new())
    }
}

/// Reject revisions git would read as an option.
fn revision_arg(rev: &str) -> Result<&str, GitdepsError> {
    if rev.starts_with('-') {
        return Err(GitdepsError::Generic {
            message: format!("Refusing revision '{rev}': it would be read as a git option"),
        });
    }
    Ok(rev)
}
