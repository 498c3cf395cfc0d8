//! swiftcli - manifest tooling for Swift-style packages
//!
//! This crate provides the library behind the `swiftcli` binary: the
//! package manifest model and its validation, dependency resolution against
//! a local package index, and Package.resolved lockfile handling.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities for swiftcli unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides manifest fixtures and on-disk package layouts.
#[cfg(test)]
pub mod test_support;

pub use core::{Manifest, PackageDependency, Requirement, Target, TargetGraph};
pub use resolver::Resolve;
pub use util::context::GlobalContext;
