//! Test utilities for swiftcli unit tests.
//!
//! Provides manifest fixtures and a helper that lays out a package on disk
//! so operations that touch the filesystem can be exercised end to end.

pub mod fixtures;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::{Manifest, MANIFEST_NAME};

/// A package written to a temporary directory.
pub struct PackageFixture {
    dir: TempDir,
}

impl PackageFixture {
    /// Write `manifest` as Package.toml in a fresh temporary directory.
    pub fn new(manifest: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_NAME), manifest).unwrap();
        PackageFixture { dir }
    }

    /// Create the source directories of every declared target.
    pub fn with_sources(self) -> Self {
        let manifest = self.manifest();
        for target in &manifest.targets {
            std::fs::create_dir_all(self.root().join(target.source_dir())).unwrap();
        }
        self
    }

    /// Write an extra file relative to the package root.
    pub fn with_file(self, relative: impl AsRef<Path>, contents: &str) -> Self {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root().join(MANIFEST_NAME)
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::load(&self.manifest_path()).unwrap()
    }
}
