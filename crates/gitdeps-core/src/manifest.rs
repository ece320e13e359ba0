//! Dependency manifests and the file formats they are read from.
//!
//! Three formats are understood, each keyed by repository location:
//!
//! - `Gitdeps.toml` with `[dependencies]` / `[dev-dependencies]` tables
//! - `package.json` with `dependencies` / `devDependencies` objects
//! - the first `*.csproj` file, using `PackageReference` elements
//!
//! A directory without a file of a given format simply has no manifest in
//! that format. [`ChainLoader`] tries the formats in turn.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gitdeps_util::errors::GitdepsError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::package::PackageInfo;

pub const TOML_MANIFEST: &str = "Gitdeps.toml";
pub const JSON_MANIFEST: &str = "package.json";
pub const PROJECT_EXTENSION: &str = "csproj";

/// The declared dependencies of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub dependencies: Vec<PackageInfo>,
    pub dev_dependencies: Vec<PackageInfo>,
}

impl Manifest {
    /// Dependencies that are resolved transitively.
    pub fn production_dependencies(&self) -> &[PackageInfo] {
        &self.dependencies
    }

    /// Dependencies needed only to develop the project itself; never resolved
    /// automatically.
    pub fn development_dependencies(&self) -> &[PackageInfo] {
        &self.dev_dependencies
    }
}

/// A manifest file format.
pub trait ManifestLoader: Send + Sync {
    /// Short name of the format for diagnostics.
    fn format(&self) -> &'static str;

    /// Read the manifest in `dir`.
    ///
    /// Returns `Ok(None)` when `dir` has no file in this format and an error
    /// when a file exists but cannot be understood.
    fn read(&self, dir: &Path) -> Result<Option<Manifest>, GitdepsError>;

    /// Like [`ManifestLoader::read`], but never fails: unreadable manifests
    /// are logged and treated as absent.
    fn load_from_directory(&self, dir: &Path) -> Option<Manifest> {
        match self.read(dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable {} manifest in {}: {e}",
                    self.format(),
                    dir.display()
                );
                None
            }
        }
    }
}

/// Tries several formats in order; the first one present wins.
pub struct ChainLoader {
    loaders: Vec<Box<dyn ManifestLoader>>,
}

impl ChainLoader {
    pub fn new(loaders: Vec<Box<dyn ManifestLoader>>) -> Self {
        Self { loaders }
    }

    /// `Gitdeps.toml`, then `package.json`, then `*.csproj`.
    pub fn default_formats() -> Self {
        Self::new(vec![
            Box::new(TomlManifestLoader),
            Box::new(JsonManifestLoader),
            Box::new(XmlProjectManifestLoader),
        ])
    }
}

impl Default for ChainLoader {
    fn default() -> Self {
        Self::default_formats()
    }
}

impl ManifestLoader for ChainLoader {
    fn format(&self) -> &'static str {
        "any"
    }

    fn read(&self, dir: &Path) -> Result<Option<Manifest>, GitdepsError> {
        for loader in &self.loaders {
            if let Some(manifest) = loader.read(dir)? {
                return Ok(Some(manifest));
            }
        }
        Ok(None)
    }

    fn load_from_directory(&self, dir: &Path) -> Option<Manifest> {
        self.loaders
            .iter()
            .find_map(|loader| loader.load_from_directory(dir))
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, GitdepsError> {
    if !path.is_file() {
        return Ok(None);
    }
    std::fs::read_to_string(path).map(Some).map_err(GitdepsError::Io)
}

/// Attach the file name to manifest errors; other errors pass through.
fn in_file(path: &Path, err: GitdepsError) -> GitdepsError {
    match err {
        GitdepsError::Manifest { message } => GitdepsError::Manifest {
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    }
}

fn to_packages<'a>(
    entries: impl IntoIterator<Item = (&'a String, Option<&'a str>, Option<&'a str>)>,
) -> Result<Vec<PackageInfo>, GitdepsError> {
    entries
        .into_iter()
        .map(|(source, constraint, package)| {
            let info = PackageInfo::new(source, constraint)?;
            Ok(match package {
                Some(name) => info.with_package(name)?,
                None => info,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Gitdeps.toml
// ---------------------------------------------------------------------------

/// A dependency value in `Gitdeps.toml`: either the constraint text or a
/// table with an optional constraint and storage name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TomlDependency {
    Short(String),
    Detailed(DetailedDependency),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedDependency {
    #[serde(default)]
    pub version: Option<String>,
    /// Overrides the package component of the storage key.
    #[serde(default)]
    pub package: Option<String>,
}

impl TomlDependency {
    fn constraint(&self) -> Option<&str> {
        match self {
            TomlDependency::Short(s) => Some(s),
            TomlDependency::Detailed(d) => d.version.as_deref(),
        }
    }

    fn package(&self) -> Option<&str> {
        match self {
            TomlDependency::Short(_) => None,
            TomlDependency::Detailed(d) => d.package.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlManifestFile {
    #[serde(default)]
    pub dependencies: BTreeMap<String, TomlDependency>,
    #[serde(default, rename = "dev-dependencies")]
    pub dev_dependencies: BTreeMap<String, TomlDependency>,
}

/// Parse `Gitdeps.toml` content.
pub fn parse_toml_manifest(content: &str) -> Result<Manifest, GitdepsError> {
    let raw: TomlManifestFile = toml::from_str(content).map_err(|e| GitdepsError::Manifest {
        message: format!("Failed to parse {TOML_MANIFEST}: {e}"),
    })?;
    Ok(Manifest {
        dependencies: toml_packages(&raw.dependencies)?,
        dev_dependencies: toml_packages(&raw.dev_dependencies)?,
    })
}

fn toml_packages(
    map: &BTreeMap<String, TomlDependency>,
) -> Result<Vec<PackageInfo>, GitdepsError> {
    to_packages(
        map.iter()
            .map(|(source, dep)| (source, dep.constraint(), dep.package())),
    )
}

pub struct TomlManifestLoader;

impl ManifestLoader for TomlManifestLoader {
    fn format(&self) -> &'static str {
        TOML_MANIFEST
    }

    fn read(&self, dir: &Path) -> Result<Option<Manifest>, GitdepsError> {
        let path = dir.join(TOML_MANIFEST);
        match read_optional(&path)? {
            Some(content) => parse_toml_manifest(&content)
                .map(Some)
                .map_err(|e| in_file(&path, e)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// package.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
struct JsonManifestFile {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
}

/// Parse `package.json` content whose dependency keys are repository locations.
pub fn parse_json_manifest(content: &str) -> Result<Manifest, GitdepsError> {
    let raw: JsonManifestFile =
        serde_json::from_str(content).map_err(|e| GitdepsError::Manifest {
            message: format!("Failed to parse {JSON_MANIFEST}: {e}"),
        })?;
    Ok(Manifest {
        dependencies: json_packages(&raw.dependencies)?,
        dev_dependencies: json_packages(&raw.dev_dependencies)?,
    })
}

fn json_packages(map: &BTreeMap<String, String>) -> Result<Vec<PackageInfo>, GitdepsError> {
    to_packages(
        map.iter()
            .map(|(source, constraint)| (source, Some(constraint.as_str()), None)),
    )
}

pub struct JsonManifestLoader;

impl ManifestLoader for JsonManifestLoader {
    fn format(&self) -> &'static str {
        JSON_MANIFEST
    }

    fn read(&self, dir: &Path) -> Result<Option<Manifest>, GitdepsError> {
        let path = dir.join(JSON_MANIFEST);
        match read_optional(&path)? {
            Some(content) => parse_json_manifest(&content)
                .map(Some)
                .map_err(|e| in_file(&path, e)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// *.csproj
// ---------------------------------------------------------------------------

/// Parse the `PackageReference` elements of a project file.
///
/// `Include` is the repository location and `Version` the constraint.
/// References marked `PrivateAssets="all"` are development-only.
pub fn parse_project_manifest(xml: &str) -> Result<Manifest, GitdepsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut manifest = Manifest::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"PackageReference" =>
            {
                let reference = read_reference(e)?;
                let Some(source) = reference.include else {
                    continue;
                };
                let info = PackageInfo::new(&source, reference.version.as_deref())?;
                if reference.private_assets_all {
                    manifest.dev_dependencies.push(info);
                } else {
                    manifest.dependencies.push(info);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GitdepsError::Manifest {
                    message: format!("Failed to parse project file: {e}"),
                });
            }
            _ => {}
        }
    }

    Ok(manifest)
}

#[derive(Default)]
struct Reference {
    include: Option<String>,
    version: Option<String>,
    private_assets_all: bool,
}

fn read_reference(element: &BytesStart<'_>) -> Result<Reference, GitdepsError> {
    let mut reference = Reference::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| GitdepsError::Manifest {
            message: format!("Malformed PackageReference attribute: {e}"),
        })?;
        let value = attr
            .unescape_value()
            .map_err(|e| GitdepsError::Manifest {
                message: format!("Malformed PackageReference attribute: {e}"),
            })?
            .to_string();
        match attr.key.as_ref() {
            b"Include" => reference.include = Some(value),
            b"Version" => reference.version = Some(value),
            b"PrivateAssets" => reference.private_assets_all = value.eq_ignore_ascii_case("all"),
            _ => {}
        }
    }
    Ok(reference)
}

/// The first project file in `dir`, by file name.
fn find_project_file(dir: &Path) -> Result<Option<PathBuf>, GitdepsError> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == PROJECT_EXTENSION))
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}

pub struct XmlProjectManifestLoader;

impl ManifestLoader for XmlProjectManifestLoader {
    fn format(&self) -> &'static str {
        "*.csproj"
    }

    fn read(&self, dir: &Path) -> Result<Option<Manifest>, GitdepsError> {
        let Some(path) = find_project_file(dir)? else {
            return Ok(None);
        };
        let content = std::fs::read_to_string(&path)?;
        parse_project_manifest(&content)
            .map(Some)
            .map_err(|e| in_file(&path, e))
    }
}
