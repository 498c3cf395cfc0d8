//! Configuration file support.
//!
//! Two locations are read:
//! - Global: `<config dir>/config.toml` (e.g. `~/.config/swiftcli/config.toml`)
//! - Project: `.swiftcli/config.toml` next to Package.toml
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// swiftcli configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package index used for resolution. Relative paths are resolved
    /// against the directory of the config file that set them.
    pub index: Option<PathBuf>,

    pub resolve: ResolveConfig,

    pub term: TermConfig,
}

/// Resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Fail instead of rewriting a stale Package.resolved
    pub locked: bool,
}

/// Terminal settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    /// auto, always or never
    pub color: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        if let (Some(index), Some(base)) = (config.index.as_ref(), path.parent()) {
            if index.is_relative() {
                config.index = Some(base.join(index));
            }
        }

        Ok(config)
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.index.is_some() {
            self.index = other.index;
        }
        if other.resolve.locked {
            self.resolve.locked = true;
        }
        if other.term.color.is_some() {
            self.term.color = other.term.color;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.swiftcli/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: Option<&Path>) -> Config {
    let mut config = Config::default();

    if let Some(path) = global_path {
        config.merge(Config::load_or_default(path));
    }

    if let Some(path) = project_path {
        config.merge(Config::load_or_default(path));
    }

    config
}

/// Global config path, e.g. `~/.config/swiftcli/config.toml` on Linux.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "swiftcli").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Project config path (`.swiftcli/config.toml`).
pub fn project_config_path(package_root: &Path) -> PathBuf {
    package_root.join(".swiftcli").join("config.toml")
}
