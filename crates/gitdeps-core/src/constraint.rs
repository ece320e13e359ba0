//! Version constraints and the revision sets they accept.
//!
//! A [`Constraint`] holds no repository state. Each call to
//! [`Constraint::satisfying`] asks the [`Repository`] for fresh facts, so two
//! evaluations against the same checkout may differ if the checkout changed
//! in between.

use std::fmt;
use std::path::Path;

use gitdeps_util::errors::GitdepsError;
use indexmap::IndexSet;

use crate::repository::Repository;
use crate::version::{Comparator, SemanticVersion};

/// Revision ids in the order they were produced. Duplicates collapse.
pub type RevisionSet = IndexSet<String>;

/// An expression over tags, branches and commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Tags that parse as semantic versions accepted by the comparator.
    BySemver(Comparator),
    ByTag(String),
    ByBranch(String),
    ByRevision(String),
    /// Intersection of the children. No children accepts nothing.
    All(Vec<Constraint>),
    /// Union of the children. No children accepts nothing.
    Any(Vec<Constraint>),
}

impl Constraint {
    /// The revisions of the repository at `path` this constraint accepts.
    pub fn satisfying(
        &self,
        repo: &dyn Repository,
        path: &Path,
    ) -> Result<RevisionSet, GitdepsError> {
        match self {
            Constraint::BySemver(cmp) => {
                let mut accepted = RevisionSet::new();
                for tag in repo.list_tags(path)? {
                    let Ok(version) = SemanticVersion::parse(&tag) else {
                        continue;
                    };
                    if cmp.accepts(&version) {
                        accepted.extend(repo.revisions_for_tag(path, &tag)?);
                    }
                }
                Ok(accepted)
            }
            Constraint::ByTag(name) => Ok(repo.revisions_for_tag(path, name)?.into_iter().collect()),
            Constraint::ByBranch(name) => {
                Ok(repo.revisions_in_branch(path, name)?.into_iter().collect())
            }
            Constraint::ByRevision(id) => {
                let known = repo.list_commits(path)?.iter().any(|c| c == id);
                Ok(if known {
                    RevisionSet::from([id.clone()])
                } else {
                    RevisionSet::new()
                })
            }
            Constraint::All(children) => {
                let mut iter = children.iter();
                let Some(first) = iter.next() else {
                    return Ok(RevisionSet::new());
                };
                let mut acc = first.satisfying(repo, path)?;
                for child in iter {
                    let next = child.satisfying(repo, path)?;
                    acc.retain(|rev| next.contains(rev));
                }
                Ok(acc)
            }
            Constraint::Any(children) => {
                let mut acc = RevisionSet::new();
                for child in children {
                    acc.extend(child.satisfying(repo, path)?);
                }
                Ok(acc)
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::BySemver(cmp) => write!(f, "{cmp}"),
            Constraint::ByTag(name) => write!(f, "tag={name}"),
            Constraint::ByBranch(name) => write!(f, "branch={name}"),
            Constraint::ByRevision(id) => write!(f, "revision={id}"),
            Constraint::All(children) => write_group(f, "and", children),
            Constraint::Any(children) => write_group(f, "or", children),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, keyword: &str, children: &[Constraint]) -> fmt::Result {
    write!(f, "{keyword}(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}
