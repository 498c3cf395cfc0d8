//! High-level operations.
//!
//! This module contains the implementation of swiftcli commands.

pub mod check;
pub mod describe;
pub mod edit;
pub mod init;
pub mod lockfile;
pub mod resolve;
pub mod tree;

pub use check::{check, check_with, CheckOptions, CheckReport};
pub use describe::{describe, PackageDescription};
pub use edit::{add_dependency, remove_dependency, AddResult, RemoveResult};
pub use init::{init_package, InitOptions, InitResult};
pub use lockfile::{compute_origin_hash, load_lockfile, needs_update, Lockfile};
pub use resolve::{resolve_package, PinChange, ResolveOptions, ResolveOutcome, ResolveStatus};
pub use tree::{package_tree, target_tree, TreeOptions};
