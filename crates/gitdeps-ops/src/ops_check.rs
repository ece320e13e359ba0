//! Operation: parse a constraint and optionally evaluate it against a checkout.

use std::path::Path;

use gitdeps_core::constraint::Constraint;
use gitdeps_core::parser;
use gitdeps_core::repository::Repository;

/// Outcome of `gitdeps check`.
#[derive(Debug)]
pub struct CheckReport {
    pub constraint: Constraint,
    /// Accepted revisions, when a repository was given.
    pub revisions: Option<Vec<String>>,
}

/// Parse `text`, and when `repo` is given list the revisions it accepts there.
pub fn check(
    text: &str,
    repo: Option<&Path>,
    git: &dyn Repository,
) -> miette::Result<CheckReport> {
    let constraint = parser::parse(text)?;
    let revisions = match repo {
        Some(path) => Some(
            constraint
                .satisfying(git, path)?
                .into_iter()
                .collect::<Vec<_>>(),
        ),
        None => None,
    };
    Ok(CheckReport {
        constraint,
        revisions,
    })
}
