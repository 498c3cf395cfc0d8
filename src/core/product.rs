//! Product definitions - what a package vends.
//!
//! A Product is a named build output (executable or library) assembled from
//! one or more targets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Executable binary
    #[serde(alias = "exe", alias = "bin")]
    Executable,

    /// Library, linked according to its `Linkage`
    #[serde(alias = "lib")]
    Library,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Executable => "executable",
            ProductKind::Library => "library",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a library product is linked into its clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Left to the build tool
    #[default]
    Automatic,
    #[serde(alias = "staticlib")]
    Static,
    #[serde(alias = "dylib", alias = "shared")]
    Dynamic,
}

impl Linkage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Linkage::Automatic => "automatic",
            Linkage::Static => "static",
            Linkage::Dynamic => "dynamic",
        }
    }
}

/// A named product with the targets it is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub name: String,
    pub kind: ProductKind,
    /// Only meaningful for libraries
    pub linkage: Linkage,
    pub targets: Vec<String>,
}

impl Product {
    /// Create an executable product.
    pub fn executable(name: impl Into<String>) -> Self {
        Product {
            name: name.into(),
            kind: ProductKind::Executable,
            linkage: Linkage::Automatic,
            targets: Vec::new(),
        }
    }

    /// Create a library product.
    pub fn library(name: impl Into<String>, linkage: Linkage) -> Self {
        Product {
            name: name.into(),
            kind: ProductKind::Library,
            linkage,
            targets: Vec::new(),
        }
    }

    /// Set the targets this product is built from.
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_executable(&self) -> bool {
        self.kind == ProductKind::Executable
    }

    /// Short description such as `library (dynamic)`.
    pub fn describe_kind(&self) -> String {
        match self.kind {
            ProductKind::Executable => "executable".to_string(),
            ProductKind::Library => format!("library ({})", self.linkage.as_str()),
        }
    }
}
