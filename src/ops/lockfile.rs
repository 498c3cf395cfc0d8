//! Package.resolved encoding and I/O.
//!
//! The lockfile lists one pin per resolved package. Its `originHash` is a
//! hash of the manifest's dependency declarations, so freshness is decided
//! by content rather than timestamps.

use std::path::Path;

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::{Location, Manifest};
use crate::resolver::{PinState, Resolve, ResolvedPackage};
use crate::util::fs::write_atomic;

/// Format version written by this tool.
pub const LOCKFILE_VERSION: u32 = 3;

/// Versions that share the pin layout and can be read.
const SUPPORTED_VERSIONS: &[u32] = &[2, 3];

/// Lockfile representation for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lockfile {
    /// Hash of the manifest's dependency declarations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_hash: Option<String>,

    #[serde(default)]
    pub pins: Vec<Pin>,

    pub version: u32,
}

/// A pinned package entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub identity: String,
    pub kind: PinKind,
    pub location: String,
    pub state: PinRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PinKind {
    RemoteSourceControl,
    LocalSourceControl,
}

/// The `state` object of a pin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Lockfile {
    /// Create a lockfile from a Resolve.
    pub fn from_resolve(resolve: &Resolve) -> Self {
        let pins = resolve
            .packages()
            .map(|package| Pin {
                identity: package.identity.clone(),
                kind: if package.location.contains("://") {
                    PinKind::RemoteSourceControl
                } else {
                    PinKind::LocalSourceControl
                },
                location: package.location.clone(),
                state: match &package.state {
                    PinState::Version { version, revision } => PinRecord {
                        version: Some(version.to_string()),
                        revision: revision.clone(),
                        branch: None,
                    },
                    PinState::Branch { name, revision } => PinRecord {
                        branch: Some(name.clone()),
                        revision: revision.clone(),
                        version: None,
                    },
                    PinState::Revision(rev) => PinRecord {
                        revision: Some(rev.clone()),
                        ..Default::default()
                    },
                },
            })
            .collect();

        // Resolve::packages is ordered by identity, so output is deterministic.
        Lockfile {
            origin_hash: None,
            pins,
            version: LOCKFILE_VERSION,
        }
    }

    pub fn with_origin_hash(mut self, hash: impl Into<String>) -> Self {
        self.origin_hash = Some(hash.into());
        self
    }

    /// Rebuild the pins as a Resolve. The lockfile does not record edges,
    /// so the result has none.
    pub fn to_resolve(&self) -> Result<Resolve> {
        let mut resolve = Resolve::new();

        for pin in &self.pins {
            let state = match (&pin.state.version, &pin.state.branch, &pin.state.revision) {
                (Some(version), _, revision) => PinState::Version {
                    version: version.parse().with_context(|| {
                        format!("invalid version `{}` pinned for `{}`", version, pin.identity)
                    })?,
                    revision: revision.clone(),
                },
                (None, Some(branch), revision) => PinState::Branch {
                    name: branch.clone(),
                    revision: revision.clone(),
                },
                (None, None, Some(revision)) => PinState::Revision(revision.clone()),
                (None, None, None) => bail!("pin for `{}` has an empty state", pin.identity),
            };

            resolve.add_package(ResolvedPackage {
                identity: pin.identity.clone(),
                location: pin.location.clone(),
                state,
            });
            resolve.add_root(&pin.identity);
        }

        Ok(resolve)
    }

    /// Pinned versions, for keeping them across a re-resolution.
    pub fn pinned_versions(&self) -> Vec<(String, Version)> {
        self.pins
            .iter()
            .filter_map(|pin| {
                let version = pin.state.version.as_deref()?.parse().ok()?;
                Some((pin.identity.clone(), version))
            })
            .collect()
    }

    pub fn pin(&self, identity: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.identity == identity)
    }

    /// Load a lockfile from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lockfile: {}", path.display()))?;

        let lockfile: Lockfile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse lockfile: {}", path.display()))?;

        if !SUPPORTED_VERSIONS.contains(&lockfile.version) {
            bail!(
                "{} has format version {}, expected one of {:?}",
                path.display(),
                lockfile.version,
                SUPPORTED_VERSIONS
            );
        }

        Ok(lockfile)
    }

    /// Save the lockfile to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content =
            serde_json::to_string_pretty(self).context("failed to serialize lockfile")?;
        content.push('\n');
        write_atomic(path, &content)
    }
}

/// Load the lockfile if it exists.
pub fn load_lockfile(path: &Path) -> Result<Option<Lockfile>> {
    if !path.exists() {
        return Ok(None);
    }
    Lockfile::load(path).map(Some)
}

/// Compute a hash of the manifest's dependency declarations.
///
/// Only the location and requirement of each dependency are hashed, in
/// identity order, so reordering entries or editing targets, products or
/// comments leaves the hash unchanged.
pub fn compute_origin_hash(manifest: &Manifest) -> Result<String> {
    let mut deps: Vec<_> = manifest.dependencies.iter().collect();
    deps.sort_by_key(|d| d.identity());

    let normalized: Vec<serde_json::Value> = deps
        .iter()
        .map(|dep| {
            let location = match dep.location() {
                Location::Remote(url) => url.as_str().trim_end_matches('/').to_string(),
                // Absolute paths differ between checkouts; the identity is stable.
                Location::Local(_) => format!("local:{}", dep.identity()),
            };
            serde_json::json!({
                "identity": dep.identity(),
                "location": location,
                "requirement": dep.requirement().to_string(),
            })
        })
        .collect();

    let bytes = serde_json::to_vec(&normalized).context("failed to serialize dependencies")?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Check whether the lockfile must be regenerated.
///
/// True when it is missing, unreadable, carries no origin hash, or was
/// written for different dependency declarations.
pub fn needs_update(manifest: &Manifest, lockfile_path: &Path) -> Result<bool> {
    let lockfile = match load_lockfile(lockfile_path) {
        Ok(Some(lockfile)) => lockfile,
        Ok(None) => return Ok(true),
        Err(e) => {
            tracing::debug!("ignoring unreadable lockfile: {:#}", e);
            return Ok(true);
        }
    };

    let Some(stored) = lockfile.origin_hash else {
        return Ok(true);
    };

    Ok(stored != compute_origin_hash(manifest)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, PackageFixture};

    fn sample_resolve() -> Resolve {
        let mut resolve = Resolve::new();
        resolve.add_package(ResolvedPackage {
            identity: "quick".to_string(),
            location: "https://github.com/Quick/Quick".to_string(),
            state: PinState::Version {
                version: Version::new(2, 2, 1),
                revision: Some("09b3becb37cb2163919a3842a4c5fa6ec7130792".to_string()),
            },
        });
        resolve.add_package(ResolvedPackage {
            identity: "nimble".to_string(),
            location: "https://github.com/Quick/Nimble".to_string(),
            state: PinState::Branch {
                name: "main".to_string(),
                revision: None,
            },
        });
        resolve
    }

    #[test]
    fn test_lockfile_roundtrip() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        let path = fixture.root().join("Package.resolved");

        let lockfile = Lockfile::from_resolve(&sample_resolve()).with_origin_hash("abc");
        lockfile.save(&path).unwrap();

        let loaded = load_lockfile(&path).unwrap().unwrap();
        assert_eq!(loaded, lockfile);

        let resolve = loaded.to_resolve().unwrap();
        assert_eq!(resolve.len(), 2);
        assert_eq!(
            resolve.package("quick").unwrap().state.version(),
            Some(&Version::new(2, 2, 1))
        );
    }

    #[test]
    fn test_json_layout() {
        let json = serde_json::to_value(Lockfile::from_resolve(&sample_resolve()).with_origin_hash("abc"))
            .unwrap();

        assert_eq!(json["originHash"], "abc");
        assert_eq!(json["version"], 3);
        // pins are sorted by identity
        assert_eq!(json["pins"][0]["identity"], "nimble");
        assert_eq!(json["pins"][0]["state"]["branch"], "main");
        assert!(json["pins"][0]["state"].get("version").is_none());
        assert_eq!(json["pins"][1]["kind"], "remoteSourceControl");
        assert_eq!(json["pins"][1]["state"]["version"], "2.2.1");
    }

    #[test]
    fn test_reads_version_two() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST).with_file(
            "Package.resolved",
            r#"{
  "pins" : [
    {
      "identity" : "nimble",
      "kind" : "remoteSourceControl",
      "location" : "https://github.com/Quick/Nimble",
      "state" : {
        "revision" : "7a46a5fc86cb917f69e3daf79fcb045283d8f008",
        "version" : "8.0.9"
      }
    }
  ],
  "version" : 2
}
"#,
        );
        let path = fixture.root().join("Package.resolved");

        let lockfile = Lockfile::load(&path).unwrap();
        assert_eq!(lockfile.origin_hash, None);
        assert_eq!(
            lockfile.pinned_versions(),
            vec![("nimble".to_string(), Version::new(8, 0, 9))]
        );
        // no origin hash: freshness cannot be proven
        assert!(needs_update(&fixture.manifest(), &path).unwrap());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST)
            .with_file("Package.resolved", r#"{ "pins": [], "version": 1 }"#);

        let err = Lockfile::load(&fixture.root().join("Package.resolved")).unwrap_err();
        assert!(err.to_string().contains("format version 1"));
    }

    #[test]
    fn test_needs_update_detects_dependency_change() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        let manifest = fixture.manifest();
        let path = manifest.lockfile_path();

        assert!(needs_update(&manifest, &path).unwrap());

        Lockfile::from_resolve(&Resolve::new())
            .with_origin_hash(compute_origin_hash(&manifest).unwrap())
            .save(&path)
            .unwrap();
        assert!(!needs_update(&manifest, &path).unwrap());

        let changed = fixtures::SWIFTCLI_MANIFEST.replace("from = \"8.0.9\"", "from = \"9.0.0\"");
        std::fs::write(fixture.manifest_path(), changed).unwrap();
        assert!(needs_update(&fixture.manifest(), &path).unwrap());
    }

    #[test]
    fn test_origin_hash_ignores_targets_and_order() {
        let original = fixtures::manifest(fixtures::SWIFTCLI_MANIFEST);

        let mut reordered = original.clone();
        reordered.dependencies.reverse();
        reordered.targets.clear();
        reordered.name = "Renamed".to_string();

        assert_eq!(
            compute_origin_hash(&original).unwrap(),
            compute_origin_hash(&reordered).unwrap()
        );

        let mut fewer = original.clone();
        fewer.dependencies.pop();
        assert_ne!(
            compute_origin_hash(&original).unwrap(),
            compute_origin_hash(&fewer).unwrap()
        );
    }

    #[test]
    fn test_missing_lockfile() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        assert!(load_lockfile(&fixture.root().join("Package.resolved"))
            .unwrap()
            .is_none());
    }
}
