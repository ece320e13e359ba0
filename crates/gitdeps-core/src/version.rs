//! Semantic version numbers and the comparators the constraint language
//! builds on.
//!
//! Versions are plain `major.minor.patch` triples. Missing trailing
//! components default to zero, so `1` and `1.0.0` are the same version.
//! Pre-release and build suffixes are not part of the model: a tag such as
//! `1.0.0-rc1` does not parse and is ignored by semver constraints.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A `major.minor.patch` version with numeric ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

/// Text that is not a `major(.minor(.patch)?)?` version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a semantic version")]
pub struct ParseVersionError(pub String);

impl SemanticVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `major(.minor(.patch)?)?`, tolerating a single leading `v`.
    pub fn parse(text: &str) -> Result<Self, ParseVersionError> {
        let fail = || ParseVersionError(text.to_string());
        let body = text
            .strip_prefix('v')
            .or_else(|| text.strip_prefix('V'))
            .unwrap_or(text);

        let mut parts = [0u64; 3];
        let mut count = 0;
        for segment in body.split('.') {
            if count == parts.len() {
                return Err(fail());
            }
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(fail());
            }
            parts[count] = segment.parse().map_err(|_| fail())?;
            count += 1;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl FromStr for SemanticVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A predicate over candidate versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    GreaterThan(SemanticVersion),
    GreaterOrEqual(SemanticVersion),
    LessThan(SemanticVersion),
    LessOrEqual(SemanticVersion),
    /// Inclusive on both ends. Build with [`Comparator::in_range`] so the
    /// bounds are ordered.
    InRange {
        low: SemanticVersion,
        high: SemanticVersion,
    },
    /// Same major, strictly greater minor. There is no upper bound on the
    /// minor and the patch is not considered.
    SameMajorGreaterMinor(SemanticVersion),
}

impl Comparator {
    /// An inclusive range whose bounds may be given in either order.
    pub fn in_range(a: SemanticVersion, b: SemanticVersion) -> Self {
        Comparator::InRange {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn accepts(&self, candidate: &SemanticVersion) -> bool {
        match self {
            Comparator::GreaterThan(v) => candidate > v,
            Comparator::GreaterOrEqual(v) => candidate >= v,
            Comparator::LessThan(v) => candidate < v,
            Comparator::LessOrEqual(v) => candidate <= v,
            Comparator::InRange { low, high } => candidate >= low && candidate <= high,
            Comparator::SameMajorGreaterMinor(v) => {
                candidate.major == v.major && candidate.minor > v.minor
            }
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::GreaterThan(v) => write!(f, ">{v}"),
            Comparator::GreaterOrEqual(v) => write!(f, ">={v}"),
            Comparator::LessThan(v) => write!(f, "<{v}"),
            Comparator::LessOrEqual(v) => write!(f, "<={v}"),
            Comparator::InRange { low, high } => write!(f, "{low}-{high}"),
            Comparator::SameMajorGreaterMinor(v) => write!(f, "~{v}"),
        }
    }
}
