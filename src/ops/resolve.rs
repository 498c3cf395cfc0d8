//! Package resolution operations.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use crate::core::dependency::identity_from_name;
use crate::core::Manifest;
use crate::ops::lockfile::{compute_origin_hash, load_lockfile, Lockfile};
use crate::resolver::{Resolve, ResolveError, SwiftResolver};
use crate::sources::Source;
use crate::util::diagnostic::suggestions;

/// Options for resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Fail instead of writing when Package.resolved is stale
    pub locked: bool,

    /// Re-resolve even when Package.resolved is fresh
    pub force: bool,

    /// Packages whose pins are dropped before resolving. `Some(empty)`
    /// drops every pin.
    pub update: Option<Vec<String>>,

    /// Write Package.resolved
    pub write: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            locked: false,
            force: false,
            update: None,
            write: true,
        }
    }
}

/// How the outcome was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    /// Package.resolved was fresh and reused
    UpToDate,
    /// Dependencies were resolved and Package.resolved written
    Written,
    /// Dependencies were resolved without writing
    NotWritten,
}

/// A pin that changed between the old and new lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinChange {
    pub identity: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

#[derive(Debug)]
pub struct ResolveOutcome {
    pub resolve: Resolve,
    pub status: ResolveStatus,
    pub changes: Vec<PinChange>,
}

/// Resolve the manifest's dependencies against `source`.
///
/// A fresh Package.resolved is reused unless `force` or `update` is set.
/// Otherwise existing pins are kept wherever the requirements still allow
/// them, except for the packages named in `update`.
pub fn resolve_package(
    manifest: &Manifest,
    source: &dyn Source,
    opts: &ResolveOptions,
) -> Result<ResolveOutcome> {
    let lockfile_path = manifest.lockfile_path();
    let existing = match load_lockfile(&lockfile_path) {
        Ok(lockfile) => lockfile,
        Err(e) => {
            tracing::warn!("ignoring existing lockfile: {:#}", e);
            None
        }
    };

    let origin_hash = compute_origin_hash(manifest)?;
    let fresh = existing
        .as_ref()
        .is_some_and(|l| l.origin_hash.as_deref() == Some(origin_hash.as_str()));

    if let Some(names) = &opts.update {
        for name in names {
            let identity = identity_from_name(name);
            let declared = manifest.dependencies.iter().any(|d| d.matches_reference(name));
            let pinned = existing.as_ref().is_some_and(|l| l.pin(&identity).is_some());
            if !declared && !pinned {
                bail!("package `{}` is not a dependency of `{}`", name, manifest.name);
            }
        }
    }

    if fresh && !opts.force && opts.update.is_none() {
        if let Some(lockfile) = &existing {
            match missing_pin(lockfile, source) {
                None => {
                    tracing::info!("using existing Package.resolved (dependencies unchanged)");
                    return Ok(ResolveOutcome {
                        resolve: lockfile.to_resolve()?,
                        status: ResolveStatus::UpToDate,
                        changes: Vec::new(),
                    });
                }
                Some((package, version)) if opts.locked => {
                    return Err(ResolveError::StalePin { package, version }.into());
                }
                Some((package, version)) => tracing::warn!(
                    "pinned `{}` {} is not in {}, re-resolving",
                    package,
                    version,
                    source.name()
                ),
            }
        }
    }

    if opts.locked && opts.write && (!fresh || opts.update.is_some()) {
        bail!(
            "Package.resolved needs to be updated but --locked was passed\n{}",
            suggestions::STALE_LOCK
        );
    }

    match &existing {
        Some(_) if !fresh => tracing::info!("dependencies changed, re-resolving"),
        None => tracing::info!("no Package.resolved found, resolving dependencies"),
        _ => {}
    }

    let mut resolver = SwiftResolver::from_source(manifest.dependencies.clone(), source);
    if let Some(lockfile) = &existing {
        for (identity, version) in lockfile.pinned_versions() {
            let dropped = match &opts.update {
                None => false,
                Some(names) if names.is_empty() => true,
                Some(names) => names.iter().any(|n| identity_from_name(n) == identity),
            };
            if !dropped {
                resolver.prefer(&identity, version);
            }
        }
    }

    let resolve = resolver.resolve()?;
    let changes = diff_pins(existing.as_ref(), &resolve);

    let status = if opts.write {
        Lockfile::from_resolve(&resolve)
            .with_origin_hash(origin_hash)
            .save(&lockfile_path)?;
        ResolveStatus::Written
    } else {
        ResolveStatus::NotWritten
    };

    Ok(ResolveOutcome {
        resolve,
        status,
        changes,
    })
}

/// First version pin the source no longer offers.
fn missing_pin(lockfile: &Lockfile, source: &dyn Source) -> Option<(String, String)> {
    lockfile
        .pinned_versions()
        .into_iter()
        .find(|(identity, version)| {
            !source
                .query(identity)
                .iter()
                .any(|release| &release.version == version)
        })
        .map(|(identity, version)| (identity, version.to_string()))
}

fn diff_pins(old: Option<&Lockfile>, new: &Resolve) -> Vec<PinChange> {
    let mut states: BTreeMap<String, (Option<String>, Option<String>)> = BTreeMap::new();

    if let Some(lockfile) = old {
        if let Ok(previous) = lockfile.to_resolve() {
            for package in previous.packages() {
                states.entry(package.identity.clone()).or_default().0 =
                    Some(package.state.to_string());
            }
        }
    }
    for package in new.packages() {
        states.entry(package.identity.clone()).or_default().1 = Some(package.state.to_string());
    }

    states
        .into_iter()
        .filter(|(_, (old, new))| old != new)
        .map(|(identity, (old, new))| PinChange { identity, old, new })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::sources::PackageIndex;
    use crate::test_support::{fixtures, PackageFixture};

    fn index() -> PackageIndex {
        PackageIndex::parse("fixture", fixtures::SWIFTCLI_INDEX, Path::new("/fixture")).unwrap()
    }

    fn pinned(lockfile: &Lockfile, identity: &str) -> Option<String> {
        lockfile.pin(identity).and_then(|p| p.state.version.clone())
    }

    #[test]
    fn test_resolve_writes_lockfile() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        let manifest = fixture.manifest();

        let outcome = resolve_package(&manifest, &index(), &ResolveOptions::default()).unwrap();
        assert_eq!(outcome.status, ResolveStatus::Written);
        assert_eq!(outcome.resolve.len(), 3);
        assert_eq!(outcome.changes.len(), 3);
        assert_eq!(outcome.changes[0].old, None);

        let lockfile = Lockfile::load(&manifest.lockfile_path()).unwrap();
        assert_eq!(pinned(&lockfile, "nimble").as_deref(), Some("8.0.9"));
        assert!(lockfile.origin_hash.is_some());
    }

    #[test]
    fn test_fresh_lockfile_is_reused() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        let manifest = fixture.manifest();
        resolve_package(&manifest, &index(), &ResolveOptions::default()).unwrap();

        let outcome = resolve_package(&manifest, &index(), &ResolveOptions::default()).unwrap();
        assert_eq!(outcome.status, ResolveStatus::UpToDate);
        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.resolve.len(), 3);
    }

    #[test]
    fn test_locked_pin_missing_from_index() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        let manifest = fixture.manifest();
        resolve_package(&manifest, &index(), &ResolveOptions::default()).unwrap();

        let trimmed = fixtures::SWIFTCLI_INDEX.replace(
            "version = \"8.0.9\"",
            "version = \"8.0.8\"",
        );
        let trimmed = PackageIndex::parse("trimmed", &trimmed, Path::new("/fixture")).unwrap();

        let opts = ResolveOptions {
            locked: true,
            ..Default::default()
        };
        let err = resolve_package(&manifest, &trimmed, &opts).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::StalePin { package, .. }) if package == "nimble"
        ));
    }

    #[test]
    fn test_locked_fails_when_stale() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        let opts = ResolveOptions {
            locked: true,
            ..Default::default()
        };

        let err = resolve_package(&fixture.manifest(), &index(), &opts).unwrap_err();
        assert!(err.to_string().contains("--locked"));
        assert!(!fixture.root().join("Package.resolved").exists());
    }

    #[test]
    fn test_pins_kept_until_updated() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST).with_file(
            "Package.resolved",
            r#"{
  "pins" : [
    {
      "identity" : "swift-argument-parser",
      "kind" : "remoteSourceControl",
      "location" : "https://github.com/apple/swift-argument-parser",
      "state" : { "version" : "0.0.1" }
    }
  ],
  "version" : 2
}"#,
        );
        let manifest = fixture.manifest();

        // stale (no origin hash), but the old pin is still allowed
        let outcome = resolve_package(&manifest, &index(), &ResolveOptions::default()).unwrap();
        let lockfile = Lockfile::load(&manifest.lockfile_path()).unwrap();
        assert_eq!(pinned(&lockfile, "swift-argument-parser").as_deref(), Some("0.0.1"));
        assert!(!outcome
            .changes
            .iter()
            .any(|c| c.identity == "swift-argument-parser"));

        let opts = ResolveOptions {
            update: Some(vec!["swift-argument-parser".to_string()]),
            ..Default::default()
        };
        let outcome = resolve_package(&manifest, &index(), &opts).unwrap();
        assert_eq!(
            outcome.changes,
            vec![PinChange {
                identity: "swift-argument-parser".to_string(),
                old: Some("0.0.1".to_string()),
                new: Some("0.0.6".to_string()),
            }]
        );
    }

    #[test]
    fn test_update_unknown_package() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        let opts = ResolveOptions {
            update: Some(vec!["left-pad".to_string()]),
            ..Default::default()
        };

        let err = resolve_package(&fixture.manifest(), &index(), &opts).unwrap_err();
        assert!(err.to_string().contains("`left-pad` is not a dependency"));
    }

    #[test]
    fn test_dry_run_leaves_disk_alone() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        let opts = ResolveOptions {
            force: true,
            write: false,
            ..Default::default()
        };

        let outcome = resolve_package(&fixture.manifest(), &index(), &opts).unwrap();
        assert_eq!(outcome.status, ResolveStatus::NotWritten);
        assert_eq!(outcome.resolve.deps("quick"), vec!["nimble"]);
        assert!(!fixture.root().join("Package.resolved").exists());
    }
}
