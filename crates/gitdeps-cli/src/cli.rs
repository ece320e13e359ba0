//! CLI argument definitions for gitdeps.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "gitdeps",
    version,
    about = "Fetch git-hosted dependencies pinned by version constraints",
    long_about = "gitdeps reads the dependencies declared in Gitdeps.toml, package.json or a \
                  *.csproj file, clones every repository at a revision matching its constraint, \
                  recurses into the fetched packages and records the result in Gitdeps.lock."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download all dependencies and write Gitdeps.lock
    Fetch {
        /// Ignore Gitdeps.lock and choose revisions from the constraints
        #[arg(long)]
        update: bool,
    },

    /// Parse a version constraint, optionally listing the revisions it accepts
    Check {
        /// Constraint text, e.g. "and(^1.0.0 <2.0.0)"
        constraint: String,
        /// Repository checkout to evaluate the constraint against
        #[arg(long)]
        repo: Option<PathBuf>,
    },

    /// Delete a downloaded package
    Remove {
        /// Repository location as declared in the manifest
        url: String,
    },

    /// Delete every downloaded package
    Clean,
}

pub fn parse() -> Cli {
    Cli::parse()
}
