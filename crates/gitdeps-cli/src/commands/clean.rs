use console::style;
use miette::Result;

use gitdeps_core::config::GlobalConfig;
use gitdeps_ops::ops_clean::{clean, CleanResult};
use gitdeps_util::progress::format_size;

pub fn exec() -> Result<()> {
    let project_root = super::locked_project_root()?;
    let config = GlobalConfig::load()?;

    match clean(&project_root, &config)? {
        CleanResult::Cleaned { freed } => println!(
            "Cleaned {} ({})",
            config.install_root(&project_root).display(),
            style(format_size(freed)).dim()
        ),
        CleanResult::NothingToClean => println!("Nothing to clean"),
    }
    Ok(())
}
