//! Core data structures.
//!
//! This module contains the manifest model:
//! - Package manifest and its loader
//! - Platforms, products, targets and external dependencies
//! - The target dependency graph

pub mod dependency;
pub mod graph;
pub mod manifest;
pub mod platform;
pub mod product;
pub mod target;

pub use dependency::{DependencySpec, Location, PackageDependency, Requirement};
pub use graph::TargetGraph;
pub use manifest::{
    find_manifest, Manifest, ManifestTemplate, ResolvedTargetDependency, LOCKFILE_NAME,
    MANIFEST_NAME,
};
pub use platform::{Platform, PlatformFamily};
pub use product::{Linkage, Product, ProductKind};
pub use target::{Target, TargetDependency, TargetKind};
