//! Handler for `gitdeps remove`.

use std::sync::Arc;

use gitdeps_core::config::GlobalConfig;
use gitdeps_git::GitCli;
use gitdeps_ops::ops_remove::remove;
use miette::Result;

pub fn exec(url: &str) -> Result<()> {
    let project_root = super::locked_project_root()?;
    let config = GlobalConfig::load()?;
    let git = Arc::new(GitCli::new(&config.git.program));

    if remove(&project_root, &config, git, url)? {
        println!("Removed {url}");
    } else {
        println!("{url} is not downloaded");
    }
    Ok(())
}
