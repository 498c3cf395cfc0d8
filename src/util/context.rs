//! Global context for swiftcli operations.
//!
//! Provides centralized access to the working directory, the manifest
//! location and merged configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::manifest::{find_manifest, MANIFEST_NAME};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};
use crate::util::diagnostic::suggestions;

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Explicit `--manifest-path`, if given
    manifest_path: Option<PathBuf>,

    /// Global config file, if the platform has a config directory
    global_config: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a context rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context rooted at `cwd`.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            manifest_path: None,
            global_config: global_config_path(),
        }
    }

    /// Use an explicit manifest path instead of searching for one.
    pub fn with_manifest_path(mut self, path: Option<PathBuf>) -> Self {
        self.manifest_path = path.map(|p| if p.is_absolute() { p } else { self.cwd.join(p) });
        self
    }

    /// Override the global config location.
    pub fn with_global_config(mut self, path: Option<PathBuf>) -> Self {
        self.global_config = path;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Locate Package.toml: the explicit path, or the nearest one at or
    /// above the working directory.
    pub fn find_manifest(&self) -> Result<PathBuf> {
        if let Some(path) = &self.manifest_path {
            if !path.is_file() {
                anyhow::bail!("manifest path `{}` does not exist", path.display());
            }
            return Ok(path.clone());
        }

        find_manifest(&self.cwd).ok_or_else(|| {
            anyhow::anyhow!(
                "could not find {} in {} or any parent directory\n{}",
                MANIFEST_NAME,
                self.cwd.display(),
                suggestions::NO_MANIFEST
            )
        })
    }

    /// Directory holding the manifest.
    pub fn package_root(&self) -> Result<PathBuf> {
        let manifest = self.find_manifest()?;
        Ok(manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone()))
    }

    /// Merged global and project configuration.
    ///
    /// Works outside a package too; only the global file is read then.
    pub fn config(&self) -> Config {
        let project = self
            .package_root()
            .ok()
            .map(|root| project_config_path(&root));
        load_config(self.global_config.as_deref(), project.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&manifest, "[package]\nname = \"x\"\n").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        assert_eq!(ctx.find_manifest().unwrap(), manifest);
        assert_eq!(ctx.package_root().unwrap(), tmp.path());
    }

    #[test]
    fn test_missing_manifest_suggests_init() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let err = ctx.find_manifest().unwrap_err().to_string();
        assert!(err.contains("could not find Package.toml"));
        assert!(err.contains("swiftcli init"));
    }

    #[test]
    fn test_explicit_manifest_path() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf())
            .with_manifest_path(Some(PathBuf::from("nested/Package.toml")));
        assert!(ctx.find_manifest().is_err());

        std::fs::create_dir_all(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("nested/Package.toml"), "[package]\nname = \"x\"\n")
            .unwrap();
        assert_eq!(
            ctx.find_manifest().unwrap(),
            tmp.path().join("nested/Package.toml")
        );
    }

    #[test]
    fn test_project_config() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), "[package]\nname = \"x\"\n").unwrap();
        let config_dir = tmp.path().join(".swiftcli");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.toml"), "index = \"../index.toml\"\n").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf()).with_global_config(None);
        let config = ctx.config();
        assert_eq!(config.index, Some(config_dir.join("../index.toml")));
    }
}
