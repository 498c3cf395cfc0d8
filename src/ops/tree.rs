//! Implementation of `swiftcli tree`.
//!
//! Two views: the target graph of the package itself, and the graph of
//! resolved external packages.

use std::collections::HashSet;
use std::fmt::Write as _;

use anyhow::{bail, Result};

use crate::core::{Manifest, ResolvedTargetDependency, Target};
use crate::resolver::Resolve;
use crate::util::diagnostic::suggestions;

#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Maximum depth to print; roots are depth 0
    pub depth: Option<usize>,

    /// Print only the tree of this target
    pub target: Option<String>,
}

/// Render the target dependency tree.
///
/// Without a target, the roots are the targets of each product followed
/// by the test targets. External products are printed as leaves.
pub fn target_tree(manifest: &Manifest, opts: &TreeOptions) -> Result<String> {
    let roots: Vec<&Target> = match &opts.target {
        Some(name) => match manifest.target(name) {
            Some(target) => vec![target],
            None => bail!(
                "no target named `{}` in package `{}`\n{}",
                name,
                manifest.name,
                suggestions::TARGET_NOT_FOUND
            ),
        },
        None => default_roots(manifest),
    };

    let max_depth = opts.depth.unwrap_or(usize::MAX);
    let mut out = String::new();
    for root in roots {
        let mut seen = HashSet::new();
        write_target(&mut out, manifest, root, 0, max_depth, &mut seen);
    }
    Ok(out)
}

fn default_roots(manifest: &Manifest) -> Vec<&Target> {
    let mut roots: Vec<&Target> = Vec::new();
    let product_targets = manifest.products.iter().flat_map(|p| p.targets.iter());

    for name in product_targets {
        if let Some(target) = manifest.target(name) {
            if !roots.iter().any(|r| r.name == target.name) {
                roots.push(target);
            }
        }
    }
    for target in manifest.test_targets() {
        if !roots.iter().any(|r| r.name == target.name) {
            roots.push(target);
        }
    }

    // a package without products still shows something
    if roots.is_empty() {
        roots.extend(manifest.targets.iter());
    }
    roots
}

fn prefix(depth: usize) -> String {
    if depth == 0 {
        String::new()
    } else {
        format!("{}├── ", "│   ".repeat(depth - 1))
    }
}

fn write_target(
    out: &mut String,
    manifest: &Manifest,
    target: &Target,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<String>,
) {
    let is_duplicate = !seen.insert(target.name.clone());
    let marker = if is_duplicate { " (*)" } else { "" };
    let _ = writeln!(out, "{}{}{}", prefix(depth), target.name, marker);

    if is_duplicate || depth >= max_depth {
        return;
    }

    for dep in &target.dependencies {
        match manifest.resolve_target_dependency(dep) {
            ResolvedTargetDependency::Target(child) => {
                write_target(out, manifest, child, depth + 1, max_depth, seen);
            }
            ResolvedTargetDependency::Product { product, package } => {
                let _ = writeln!(
                    out,
                    "{}{} ({})",
                    prefix(depth + 1),
                    product,
                    package.identity()
                );
            }
            ResolvedTargetDependency::Unknown => {
                let _ = writeln!(out, "{}{} (unknown)", prefix(depth + 1), dep.name());
            }
        }
    }
}

/// Render the resolved package graph under `root_name`.
pub fn package_tree(resolve: &Resolve, root_name: &str, depth: Option<usize>) -> String {
    let max_depth = depth.unwrap_or(usize::MAX);
    let mut out = String::new();
    let _ = writeln!(out, "{}", root_name);

    if max_depth == 0 {
        return out;
    }

    let mut seen = HashSet::new();
    for identity in resolve.roots() {
        write_package(&mut out, resolve, identity, 1, max_depth, &mut seen);
    }
    out
}

fn write_package(
    out: &mut String,
    resolve: &Resolve,
    identity: &str,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<String>,
) {
    let is_duplicate = !seen.insert(identity.to_string());
    let marker = if is_duplicate { " (*)" } else { "" };

    match resolve.package(identity) {
        Some(package) => {
            let _ = writeln!(out, "{}{}{}", prefix(depth), package, marker);
        }
        None => {
            let _ = writeln!(out, "{}{}{}", prefix(depth), identity, marker);
        }
    }

    if is_duplicate || depth >= max_depth {
        return;
    }

    for dep in resolve.deps(identity) {
        write_package(out, resolve, dep, depth + 1, max_depth, seen);
    }
}
