//! Handler for `gitdeps fetch`.

use std::sync::Arc;

use gitdeps_core::config::GlobalConfig;
use gitdeps_git::GitCli;
use gitdeps_ops::ops_fetch::{fetch, FetchOptions};
use miette::Result;

pub async fn exec(update: bool) -> Result<()> {
    let project_root = super::current_dir()?;
    let config = GlobalConfig::load()?;
    let git = Arc::new(GitCli::new(&config.git.program));

    fetch(&project_root, &config, git, &FetchOptions { update }).await?;
    Ok(())
}
