//! Local package index.
//!
//! The index is a TOML file listing every known release of every package:
//!
//! ```toml
//! [[package]]
//! identity = "swift-argument-parser"          # optional, derived from location
//! location = "https://github.com/apple/swift-argument-parser"
//! version = "0.0.6"
//! revision = "15351c1cd009eba0b6e438bfef55ea9847a8dc4a"
//! dependencies = [{ url = "https://github.com/apple/swift-docc-plugin", from = "1.0.0" }]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::core::dependency::{identity_from_name, DependencyError, DependencySpec, Location};
use crate::core::PackageDependency;
use crate::resolver::version::parse_version_lenient;
use crate::sources::Source;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read package index {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse package index {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid version `{version}` for `{identity}` in package index")]
    InvalidVersion { identity: String, version: String },

    #[error("invalid dependency of `{identity}` {version} in package index")]
    InvalidDependency {
        identity: String,
        version: Version,
        #[source]
        source: DependencyError,
    },

    #[error("`{identity}` {version} is listed more than once in package index")]
    DuplicateRelease { identity: String, version: Version },
}

/// One published version of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub identity: String,
    pub location: String,
    pub version: Version,
    /// Source-control revision the version tag points at
    pub revision: Option<String>,
    pub dependencies: Vec<PackageDependency>,
}

#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(default, rename = "package")]
    packages: Vec<RawRelease>,
}

#[derive(Debug, Deserialize)]
struct RawRelease {
    #[serde(default)]
    identity: Option<String>,
    location: String,
    version: String,
    #[serde(default)]
    revision: Option<String>,
    #[serde(default)]
    dependencies: Vec<DependencySpec>,
}

/// All known releases, keyed by identity, newest first.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    name: String,
    releases: BTreeMap<String, Vec<Release>>,
}

impl PackageIndex {
    /// Load an index file.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = std::fs::read_to_string(path).map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: RawIndex = toml::from_str(&content).map_err(|source| IndexError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or(Path::new("."));
        Self::from_raw(path.display().to_string(), raw, base)
    }

    /// Parse index content; relative dependency paths resolve against `base`.
    pub fn parse(name: &str, content: &str, base: &Path) -> Result<Self, IndexError> {
        let raw: RawIndex = toml::from_str(content).map_err(|source| IndexError::Parse {
            path: PathBuf::from(name),
            source,
        })?;
        Self::from_raw(name.to_string(), raw, base)
    }

    fn from_raw(name: String, raw: RawIndex, base: &Path) -> Result<Self, IndexError> {
        let mut releases: BTreeMap<String, Vec<Release>> = BTreeMap::new();

        for entry in raw.packages {
            let identity = match &entry.identity {
                Some(identity) => identity_from_name(identity),
                None => location_identity(&entry.location),
            };

            let version = parse_version_lenient(&entry.version).ok_or_else(|| {
                IndexError::InvalidVersion {
                    identity: identity.clone(),
                    version: entry.version.clone(),
                }
            })?;

            let dependencies = entry
                .dependencies
                .iter()
                .map(|spec| spec.to_dependency(base))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| IndexError::InvalidDependency {
                    identity: identity.clone(),
                    version: version.clone(),
                    source,
                })?;

            let list = releases.entry(identity.clone()).or_default();
            if list.iter().any(|r| r.version == version) {
                return Err(IndexError::DuplicateRelease { identity, version });
            }

            list.push(Release {
                identity,
                location: entry.location.trim_end_matches('/').to_string(),
                version,
                revision: entry.revision,
                dependencies,
            });
        }

        for list in releases.values_mut() {
            list.sort_by(|a, b| b.version.cmp(&a.version));
        }

        tracing::debug!(
            "loaded package index {} with {} packages",
            name,
            releases.len()
        );

        Ok(PackageIndex { name, releases })
    }

    /// Releases of a package, newest first.
    pub fn releases(&self, identity: &str) -> &[Release] {
        self.releases
            .get(&identity_from_name(identity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A specific release.
    pub fn release(&self, identity: &str, version: &Version) -> Option<&Release> {
        self.releases(identity).iter().find(|r| &r.version == version)
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

impl Source for PackageIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, identity: &str) -> Vec<Release> {
        self.releases(identity).to_vec()
    }

    fn identities(&self) -> Vec<String> {
        self.releases.keys().cloned().collect()
    }
}

fn location_identity(location: &str) -> String {
    match Url::parse(location) {
        Ok(url) => Location::Remote(url).identity(),
        Err(_) => {
            let last = location
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(location);
            identity_from_name(last)
        }
    }
}
