//! Command implementations

pub mod add;
pub mod check;
pub mod completions;
pub mod describe;
pub mod init;
pub mod remove;
pub mod resolve;
pub mod tree;
pub mod update;

use std::path::Path;

use anyhow::{Context, Result};

use crate::GlobalOptions;
use swiftcli_kit::core::Manifest;
use swiftcli_kit::sources::PackageIndex;
use swiftcli_kit::util::diagnostic::suggestions;

/// Find and load the manifest for the current invocation.
pub fn load_manifest(opts: &GlobalOptions) -> Result<Manifest> {
    let manifest_path = opts.ctx.find_manifest()?;
    Manifest::load(&manifest_path)
}

/// Load the package index named by `--index`/SWIFTCLI_INDEX, falling back
/// to the `index` config key.
pub fn load_index(flag: Option<&Path>, opts: &GlobalOptions) -> Result<PackageIndex> {
    let path = match flag {
        Some(path) => opts.ctx.cwd().join(path),
        None => opts.ctx.config().index.ok_or_else(|| {
            anyhow::anyhow!("no package index configured\n{}", suggestions::NO_INDEX)
        })?,
    };

    tracing::debug!("loading package index from {}", path.display());
    PackageIndex::load(&path).context("failed to load package index")
}
