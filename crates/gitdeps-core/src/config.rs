use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use gitdeps_util::errors::GitdepsError;

/// Environment variable that relocates the gitdeps data directory.
pub const HOME_ENV: &str = "GITDEPS_HOME";

/// Global user configuration loaded from `~/.gitdeps/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub install: InstallConfig,
}

/// Version-control tool settings from `[git]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_git_program")]
    pub program: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: default_git_program(),
        }
    }
}

fn default_git_program() -> String {
    "git".to_string()
}

/// Package storage settings from `[install]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Storage root; relative paths are taken from the project root.
    #[serde(default = "default_install_dir")]
    pub dir: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            dir: default_install_dir(),
        }
    }
}

fn default_install_dir() -> String {
    ".gitdeps/packages".to_string()
}

impl GlobalConfig {
    /// Load the global configuration, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| GitdepsError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            GitdepsError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Where packages of the project at `project_root` are stored.
    pub fn install_root(&self, project_root: &Path) -> PathBuf {
        let dir = Path::new(&self.install.dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            project_root.join(dir)
        }
    }
}

/// Returns the gitdeps data directory: `$GITDEPS_HOME`, else `~/.gitdeps/`.
pub fn dirs_path() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".gitdeps")
}
