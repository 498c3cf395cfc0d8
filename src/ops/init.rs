//! Implementation of `swiftcli init`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::manifest::{generate_manifest, ManifestTemplate, MANIFEST_NAME};
use crate::util::fs;

/// Options for creating a package.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Package name; defaults to the directory name
    pub name: Option<String>,

    pub template: ManifestTemplate,
}

/// What `init_package` created.
#[derive(Debug, Clone)]
pub struct InitResult {
    pub name: String,
    pub manifest_path: PathBuf,
    /// Source directories, relative to the package root
    pub source_dirs: Vec<PathBuf>,
}

/// Write a Package.toml template into `dir` and create the source
/// directories of its targets.
pub fn init_package(dir: &Path, opts: &InitOptions) -> Result<InitResult> {
    let name = match &opts.name {
        Some(name) => name.clone(),
        None => dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("cannot infer a package name from `{}`", dir.display()))?,
    };
    validate_name(&name)?;

    let manifest_path = dir.join(MANIFEST_NAME);
    if manifest_path.exists() {
        bail!("`{}` already exists in `{}`", MANIFEST_NAME, dir.display());
    }

    fs::ensure_dir(dir)?;
    fs::write_string(&manifest_path, &generate_manifest(&name, opts.template))?;

    let mut source_dirs = Vec::new();
    for (target, kind) in opts.template.targets(&name) {
        let relative = Path::new(kind.default_root()).join(&target);
        fs::ensure_dir(&dir.join(&relative))?;
        source_dirs.push(relative);
    }

    tracing::debug!(
        "initialized `{}` with {} source directories",
        name,
        source_dirs.len()
    );

    Ok(InitResult {
        name,
        manifest_path,
        source_dirs,
    })
}

/// Package names end up as target and module names, so keep them to
/// identifier-like characters.
fn validate_name(name: &str) -> Result<()> {
    let Some(first) = name.chars().next() else {
        bail!("package name cannot be empty");
    };

    if !first.is_ascii_alphabetic() && first != '_' {
        bail!(
            "invalid package name `{}`: must start with a letter or underscore",
            name
        );
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-')
    {
        bail!("invalid character `{}` in package name `{}`", bad, name);
    }

    Ok(())
}
