//! Implementation of `swiftcli add-dependency` and `swiftcli remove-dependency`.
//!
//! Edits go through toml_edit so comments and formatting elsewhere in
//! Package.toml survive.

use std::path::Path;

use anyhow::{bail, Context, Result};
use toml_edit::{value, ArrayOfTables, DocumentMut, InlineTable, Item, Table};

use crate::core::{DependencySpec, Manifest, ResolvedTargetDependency};
use crate::util::fs;

/// Result of adding a dependency.
#[derive(Debug, Clone)]
pub struct AddResult {
    pub identity: String,
    /// Human-readable requirement, e.g. `2.2.0 ..< 3.0.0`
    pub requirement: String,
}

/// Result of removing a dependency.
#[derive(Debug, Clone)]
pub struct RemoveResult {
    pub identity: String,
    /// Targets that still reference the removed package
    pub dangling: Vec<String>,
}

/// Append a `[[dependencies]]` entry to Package.toml.
pub fn add_dependency(manifest_path: &Path, spec: &DependencySpec) -> Result<AddResult> {
    let manifest = Manifest::load(manifest_path)?;

    let dependency = spec
        .to_dependency(&manifest.manifest_dir)
        .context("invalid dependency")?;
    let identity = dependency.identity();

    if manifest.dependencies.iter().any(|d| d.identity() == identity) {
        bail!(
            "package `{}` is already a dependency of `{}`",
            identity,
            manifest.name
        );
    }

    let mut doc = parse_document(manifest_path)?;
    dependencies_mut(&mut doc)?.push(spec_to_table(spec));
    fs::write_atomic(manifest_path, &doc.to_string())?;

    tracing::debug!("added `{}` to {}", identity, manifest_path.display());

    Ok(AddResult {
        identity,
        requirement: dependency.requirement().to_string(),
    })
}

/// Remove the `[[dependencies]]` entry `reference` names (identity, name
/// or URL component).
pub fn remove_dependency(manifest_path: &Path, reference: &str) -> Result<RemoveResult> {
    let manifest = Manifest::load(manifest_path)?;

    // entries map one-to-one onto [[dependencies]] tables, in order
    let Some(position) = manifest
        .dependencies
        .iter()
        .position(|d| d.matches_reference(reference))
    else {
        bail!(
            "package `{}` is not a dependency of `{}`",
            reference,
            manifest.name
        );
    };
    let removed = &manifest.dependencies[position];

    let dangling = manifest
        .targets
        .iter()
        .filter(|t| {
            t.dependencies.iter().any(|dep| {
                matches!(
                    manifest.resolve_target_dependency(dep),
                    ResolvedTargetDependency::Product { package, .. } if package == removed
                )
            })
        })
        .map(|t| t.name.clone())
        .collect();

    let mut doc = parse_document(manifest_path)?;
    let deps = dependencies_mut(&mut doc)?;
    deps.remove(position);
    if deps.is_empty() {
        doc.remove("dependencies");
    }
    fs::write_atomic(manifest_path, &doc.to_string())?;

    Ok(RemoveResult {
        identity: removed.identity(),
        dangling,
    })
}

fn parse_document(manifest_path: &Path) -> Result<DocumentMut> {
    let content = fs::read_to_string(manifest_path)?;
    content
        .parse()
        .with_context(|| format!("failed to parse {}", manifest_path.display()))
}

/// The `[[dependencies]]` array, created if missing.
fn dependencies_mut(doc: &mut DocumentMut) -> Result<&mut ArrayOfTables> {
    if !doc.contains_key("dependencies") {
        doc["dependencies"] = Item::ArrayOfTables(ArrayOfTables::new());
    }

    doc["dependencies"]
        .as_array_of_tables_mut()
        .context("`dependencies` must be written as [[dependencies]] tables")
}

fn spec_to_table(spec: &DependencySpec) -> Table {
    let mut table = Table::new();

    if let Some(url) = &spec.url {
        table["url"] = value(url.as_str());
    }
    if let Some(path) = &spec.path {
        table["path"] = value(path.to_string_lossy().into_owned());
    }
    if let Some(name) = &spec.name {
        table["name"] = value(name.as_str());
    }

    if let Some(v) = &spec.from {
        table["from"] = value(v.as_str());
    } else if let Some(v) = &spec.up_to_next_minor {
        table["up-to-next-minor"] = value(v.as_str());
    } else if let Some(v) = &spec.exact {
        table["exact"] = value(v.as_str());
    } else if let Some(range) = &spec.range {
        let mut inline = InlineTable::new();
        inline.insert("lower", range.lower.as_str().into());
        inline.insert("upper", range.upper.as_str().into());
        table["range"] = value(inline);
    } else if let Some(branch) = &spec.branch {
        table["branch"] = value(branch.as_str());
    } else if let Some(rev) = &spec.revision {
        table["revision"] = value(rev.as_str());
    }

    table
}
