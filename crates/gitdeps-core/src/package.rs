use std::fmt;
use std::path::{Path, PathBuf};

use gitdeps_util::errors::GitdepsError;
use url::Url;

use crate::constraint::Constraint;
use crate::parser;

/// Host component used for repositories without a network host
/// (`file://` URLs and plain filesystem paths).
pub const LOCAL_HOST: &str = "local";

/// One declared dependency: where to clone it from, which revisions are
/// acceptable, and where it lives once installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Repository location handed to the version-control tool.
    pub source: String,
    pub constraint: Option<Constraint>,
    pub host: String,
    /// Repository path on the host, e.g. `acme/widgets`.
    pub package: String,
}

impl PackageInfo {
    /// Build a package from its source location and optional constraint
    /// text, deriving the storage key from the location.
    pub fn new(source: &str, constraint: Option<&str>) -> Result<Self, GitdepsError> {
        let constraint = match constraint.map(str::trim) {
            Some(text) if !text.is_empty() => Some(parser::parse(text)?),
            _ => None,
        };
        let (host, package) = storage_key(source)?;
        Ok(Self {
            source: source.to_string(),
            constraint,
            host,
            package,
        })
    }

    /// Override the package component of the storage key.
    ///
    /// The name must be a relative `/`-separated path without `.`, `..` or
    /// empty segments.
    pub fn with_package(mut self, package: &str) -> Result<Self, GitdepsError> {
        let name = package.trim_matches('/');
        let bad_segment = name
            .split('/')
            .any(|s| s.is_empty() || s == "." || s == ".." || s.contains('\\'));
        if bad_segment {
            return Err(GitdepsError::Manifest {
                message: format!(
                    "Invalid package name '{package}' for {}: expected a relative path without '.' or '..' segments",
                    self.source
                ),
            });
        }
        self.package = name.to_string();
        Ok(self)
    }

    /// `<root>/<host>/<package>`. Segments that would leave `root` are skipped.
    pub fn install_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        let segments = std::iter::once(self.host.as_str()).chain(self.package.split('/'));
        for segment in segments.filter(|s| is_plain_segment(s)) {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for PackageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.package)
    }
}

/// Derive `(host, package)` from a repository location.
///
/// Accepts URLs (`https://github.com/acme/widgets.git`), scp-style remotes
/// (`git@github.com:acme/widgets.git`) and filesystem paths.
pub fn storage_key(source: &str) -> Result<(String, String), GitdepsError> {
    let invalid = |reason: &str| GitdepsError::Manifest {
        message: format!("Invalid repository location '{source}': {reason}"),
    };
    if source.trim_start().starts_with('-') {
        return Err(invalid("must not start with '-'"));
    }

    let (host, path) = match Url::parse(source) {
        Ok(url) if url.scheme() != "file" && url.host_str().is_some() => (
            url.host_str().unwrap_or(LOCAL_HOST).to_string(),
            url.path().to_string(),
        ),
        Ok(url) if url.scheme() == "file" => (LOCAL_HOST.to_string(), url.path().to_string()),
        _ => match scp_like(source) {
            Some((host, path)) => (host.to_string(), path.to_string()),
            None => (LOCAL_HOST.to_string(), source.replace('\\', "/")),
        },
    };

    let package = path
        .trim_matches('/')
        .trim_end_matches(".git")
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(|s| s.trim_end_matches(':'))
        .collect::<Vec<_>>()
        .join("/");
    if package.is_empty() {
        return Err(invalid("no repository path"));
    }
    if !is_plain_segment(&host) {
        return Err(invalid("bad host"));
    }
    Ok((host, package))
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

/// Split `user@host:path` into host and path.
fn scp_like(source: &str) -> Option<(&str, &str)> {
    let (authority, path) = source.split_once(':')?;
    if authority.contains('/') || path.starts_with("//") {
        return None;
    }
    let host = authority.rsplit('@').next()?;
    // A single letter before the colon is a Windows drive, not a host.
    if host.len() <= 1 {
        return None;
    }
    Some((host, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_url_key() {
        let (host, package) = storage_key("https://github.com/acme/widgets.git").unwrap();
        assert_eq!(host, "github.com");
        assert_eq!(package, "acme/widgets");
    }

    #[test]
    fn scp_style_key() {
        let (host, package) = storage_key("git@gitlab.com:group/sub/lib.git").unwrap();
        assert_eq!(host, "gitlab.com");
        assert_eq!(package, "group/sub/lib");
    }

    #[test]
    fn file_url_and_path_keys_are_local() {
        let (host, package) = storage_key("file:///srv/git/tools.git").unwrap();
        assert_eq!(host, LOCAL_HOST);
        assert_eq!(package, "srv/git/tools");

        let (host, package) = storage_key("/tmp/repos/lib").unwrap();
        assert_eq!(host, LOCAL_HOST);
        assert_eq!(package, "tmp/repos/lib");
    }

    #[test]
    fn parent_segments_are_dropped() {
        let (_, package) = storage_key("../sibling/repo").unwrap();
        assert_eq!(package, "sibling/repo");
    }

    #[test]
    fn option_like_source_is_rejected() {
        let err = storage_key("--upload-pack=touch /tmp/owned;").unwrap_err();
        assert!(matches!(err, GitdepsError::Manifest { .. }));
        assert!(PackageInfo::new("-c", None).is_err());
    }

    #[test]
    fn dot_host_is_rejected() {
        assert!(storage_key("..:acme/widgets").is_err());
    }

    #[test]
    fn package_override_replaces_the_key() {
        let pkg = PackageInfo::new("https://github.com/acme/widgets", None)
            .unwrap()
            .with_package("/vendor/widgets/")
            .unwrap();
        assert_eq!(
            pkg.install_path(Path::new("/deps")),
            Path::new("/deps/github.com/vendor/widgets")
        );
    }

    #[test]
    fn package_override_cannot_escape() {
        let pkg = PackageInfo::new("https://github.com/acme/widgets", None).unwrap();
        for name in ["../../../../outside", "a/../b", "./x", "a//b", "", "..\\up"] {
            let err = pkg.clone().with_package(name).unwrap_err();
            assert!(matches!(err, GitdepsError::Manifest { .. }), "{name}");
        }
    }

    #[test]
    fn install_path_skips_parent_segments() {
        let mut pkg = PackageInfo::new("https://github.com/acme/widgets", None).unwrap();
        pkg.package = "../../outside".to_string();
        assert_eq!(
            pkg.install_path(Path::new("/deps")),
            Path::new("/deps/github.com/outside")
        );
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(storage_key("https://github.com/").is_err());
    }

    #[test]
    fn install_path_nests_host_and_package() {
        let pkg = PackageInfo::new("https://github.com/acme/widgets", Some("^1.0.0")).unwrap();
        let path = pkg.install_path(Path::new("/deps"));
        assert_eq!(path, Path::new("/deps/github.com/acme/widgets"));
        assert_eq!(pkg.to_string(), "github.com/acme/widgets");
    }

    #[test]
    fn blank_constraint_is_none() {
        let pkg = PackageInfo::new("https://github.com/acme/widgets", Some("  ")).unwrap();
        assert!(pkg.constraint.is_none());
    }

    #[test]
    fn bad_constraint_is_a_syntax_error() {
        let err = PackageInfo::new("https://github.com/acme/widgets", Some("and(")).unwrap_err();
        assert!(matches!(err, GitdepsError::Syntax { .. }));
    }
}
