//! [`Repository`](gitdeps_core::repository::Repository) implementation that
//! shells out to the `git` executable.

mod cli;

pub use cli::GitCli;
