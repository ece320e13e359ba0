use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Unified error type for all gitdeps operations.
#[derive(Debug, Error, Diagnostic)]
pub enum GitdepsError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A version constraint does not match the constraint grammar.
    #[error("Invalid version constraint: cannot parse `{remainder}`")]
    #[diagnostic(help(
        "Expected one of: and(...), or(...), tag=NAME, branch=NAME, revision=ID, \
         ^X.Y.Z, ~X.Y.Z, >=X.Y.Z, <=X.Y.Z, >X.Y.Z, <X.Y.Z, X.Y.Z-X.Y.Z or a bare tag name"
    ))]
    Syntax {
        #[source_code]
        input: String,
        remainder: String,
        #[label("unexpected input")]
        span: SourceSpan,
    },

    /// No revision of a freshly cloned repository satisfies its constraint.
    #[error("No revisions of {package} match constraint '{constraint}'")]
    #[diagnostic(help("Check the tags and branches published by the repository"))]
    ConstraintUnsatisfiable { package: String, constraint: String },

    /// An installed revision is not accepted by a constraint declared elsewhere in the tree.
    #[error("{package} is checked out at {revision}, which does not satisfy '{constraint}'")]
    #[diagnostic(help(
        "Align the constraints declared for this repository across the dependency tree"
    ))]
    ConstraintConflict {
        package: String,
        revision: String,
        constraint: String,
    },

    /// An external tool (git) exited unsuccessfully or could not be started.
    #[error("`{command}` failed: {message}")]
    Execution { command: String, message: String },

    /// Invalid or malformed manifest.
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Gitdeps.toml, package.json or project file for syntax errors"))]
    Manifest { message: String },

    /// Invalid or malformed lockfile.
    #[error("Lockfile error: {message}")]
    #[diagnostic(help("Delete Gitdeps.lock and run `gitdeps fetch` to regenerate it"))]
    Lockfile { message: String },

    /// Invalid global configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
