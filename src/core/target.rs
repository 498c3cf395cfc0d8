//! Target definitions - the compilation units of a package.
//!
//! A Target has a name, a kind and a list of dependencies on other targets
//! or on products of external packages.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The kind of target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Library code
    #[default]
    #[serde(alias = "library", alias = "lib")]
    Regular,

    /// Code with an entry point
    #[serde(alias = "exe", alias = "bin")]
    Executable,

    /// Tests exercising other targets
    Test,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Regular => "regular",
            TargetKind::Executable => "executable",
            TargetKind::Test => "test",
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(self, TargetKind::Test)
    }

    /// Directory that holds this kind of target's sources by default.
    pub fn default_root(&self) -> &'static str {
        match self {
            TargetKind::Test => "Tests",
            TargetKind::Regular | TargetKind::Executable => "Sources",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetDependency {
    /// Another target in the same package.
    Target { name: String },

    /// A product vended by an external package.
    Product { name: String, package: String },

    /// A target of that name if one exists, otherwise the product of the
    /// external package with the same name.
    #[serde(rename = "byname")]
    ByName { name: String },
}

impl TargetDependency {
    pub fn by_name(name: impl Into<String>) -> Self {
        TargetDependency::ByName { name: name.into() }
    }

    pub fn target(name: impl Into<String>) -> Self {
        TargetDependency::Target { name: name.into() }
    }

    pub fn product(name: impl Into<String>, package: impl Into<String>) -> Self {
        TargetDependency::Product {
            name: name.into(),
            package: package.into(),
        }
    }

    /// The name as written in the manifest.
    pub fn name(&self) -> &str {
        match self {
            TargetDependency::Target { name }
            | TargetDependency::Product { name, .. }
            | TargetDependency::ByName { name } => name,
        }
    }
}

impl fmt::Display for TargetDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDependency::Target { name } | TargetDependency::ByName { name } => {
                f.write_str(name)
            }
            TargetDependency::Product { name, package } => write!(f, "{} ({})", name, package),
        }
    }
}

/// A target with its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,

    pub kind: TargetKind,

    /// Custom source directory, relative to the manifest directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    pub dependencies: Vec<TargetDependency>,
}

impl Target {
    /// Create a new target with the given name and kind.
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Target {
            name: name.into(),
            kind,
            path: None,
            dependencies: Vec::new(),
        }
    }

    pub fn regular(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Regular)
    }

    pub fn executable(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Executable)
    }

    pub fn test(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Test)
    }

    /// Add a dependency.
    pub fn with_dependency(mut self, dep: TargetDependency) -> Self {
        self.dependencies.push(dep);
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is_test(&self) -> bool {
        self.kind.is_test()
    }

    /// Source directory relative to the package root: the explicit `path`,
    /// or `Sources/<name>` (`Tests/<name>` for test targets).
    pub fn source_dir(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => Path::new(self.kind.default_root()).join(&self.name),
        }
    }
}
