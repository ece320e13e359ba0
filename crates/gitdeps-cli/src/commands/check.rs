//! Handler for `gitdeps check`.

use std::path::Path;

use gitdeps_core::config::GlobalConfig;
use gitdeps_git::GitCli;
use gitdeps_ops::ops_check::check;
use gitdeps_util::progress::status_warn;
use miette::Result;

pub fn exec(constraint: &str, repo: Option<&Path>) -> Result<()> {
    let config = GlobalConfig::load()?;
    let git = GitCli::new(&config.git.program);
    let report = check(constraint, repo, &git)?;

    println!("{}", report.constraint);
    if let Some(revisions) = report.revisions {
        if revisions.is_empty() {
            status_warn("Warning", "no revisions satisfy this constraint");
        }
        for rev in revisions {
            println!("{rev}");
        }
    }
    Ok(())
}
