//! Command dispatch and handler modules.

mod check;
mod clean;
mod fetch;
mod remove;

use std::path::PathBuf;

use gitdeps_core::lockfile::LOCKFILE_NAME;
use gitdeps_util::errors::GitdepsError;
use gitdeps_util::fs::find_ancestor_with;
use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Fetch { update } => fetch::exec(update).await,
        Command::Check { constraint, repo } => check::exec(&constraint, repo.as_deref()),
        Command::Remove { url } => remove::exec(&url),
        Command::Clean => clean::exec(),
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| GitdepsError::Io(e).into())
}

/// The nearest directory holding `Gitdeps.lock`, or the current directory.
fn locked_project_root() -> Result<PathBuf> {
    let cwd = current_dir()?;
    Ok(find_ancestor_with(&cwd, LOCKFILE_NAME).unwrap_or(cwd))
}
