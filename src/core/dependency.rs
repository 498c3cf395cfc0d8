//! External package dependencies.
//!
//! A PackageDependency names where another package lives (a remote URL or a
//! local path) and which versions of it are acceptable.

use std::fmt;
use std::path::{Path, PathBuf};

use semver::{Comparator, Op, Version, VersionReq};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::resolver::version::parse_version_lenient;

/// Error converting a `[[dependencies]]` entry into a dependency.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DependencyError {
    #[error("dependency must specify exactly one of `url` or `path`")]
    AmbiguousLocation,

    #[error("invalid dependency url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("dependency `{identity}` specifies more than one version requirement")]
    MultipleRequirements { identity: String },

    #[error("dependency `{identity}` needs a version requirement (`from`, `up-to-next-minor`, `exact`, `range`, `branch` or `revision`)")]
    MissingRequirement { identity: String },

    #[error("local dependency `{identity}` cannot carry a version requirement")]
    RequirementOnPath { identity: String },

    #[error("invalid version `{version}` for dependency `{identity}`")]
    InvalidVersion { identity: String, version: String },
}

/// Where a package lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl Location {
    /// The location as written in lockfiles and output.
    pub fn as_string(&self) -> String {
        match self {
            Location::Remote(url) => url.as_str().trim_end_matches('/').to_string(),
            Location::Local(path) => path.display().to_string(),
        }
    }

    /// Derive the package identity: last path component, lowercased, with
    /// any `.git` suffix removed.
    pub fn identity(&self) -> String {
        let last = match self {
            Location::Remote(url) => url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string)
                .unwrap_or_else(|| url.host_str().unwrap_or_default().to_string()),
            Location::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        identity_from_name(&last)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Normalize a package name or URL component into an identity.
pub fn identity_from_name(name: &str) -> String {
    name.strip_suffix(".git").unwrap_or(name).to_lowercase()
}

/// Which versions of a dependency are acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// `>= v, < (v.major + 1).0.0`, also for 0.x versions
    UpToNextMajor(Version),
    /// `>= v, < v.major.(v.minor + 1).0`
    UpToNextMinor(Version),
    Exact(Version),
    /// Half-open `[lower, upper)`
    Range { lower: Version, upper: Version },
    Branch(String),
    Revision(String),
    /// Path dependencies are used as they are on disk.
    Local,
}

impl Requirement {
    /// Exclusive upper bound of an up-to-next requirement; `None` when the
    /// next major or minor does not fit in a `u64`.
    pub fn next_bound(&self) -> Option<Version> {
        match self {
            Requirement::UpToNextMajor(v) => Some(Version::new(v.major.checked_add(1)?, 0, 0)),
            Requirement::UpToNextMinor(v) => {
                Some(Version::new(v.major, v.minor.checked_add(1)?, 0))
            }
            _ => None,
        }
    }

    /// The semver requirement, for requirements that select by version.
    pub fn version_req(&self) -> Option<VersionReq> {
        let comparators = match self {
            Requirement::UpToNextMajor(v) | Requirement::UpToNextMinor(v) => {
                let mut comparators = vec![comparator(Op::GreaterEq, v)];
                comparators.extend(self.next_bound().map(|b| comparator(Op::Less, &b)));
                comparators
            }
            Requirement::Exact(v) => vec![comparator(Op::Exact, v)],
            Requirement::Range { lower, upper } => {
                vec![comparator(Op::GreaterEq, lower), comparator(Op::Less, upper)]
            }
            Requirement::Branch(_) | Requirement::Revision(_) | Requirement::Local => {
                return None
            }
        };

        Some(VersionReq { comparators })
    }

    pub fn is_version_based(&self) -> bool {
        self.version_req().is_some()
    }

    /// Whether a version-based requirement admits no version at all.
    pub fn is_empty_range(&self) -> bool {
        match self {
            Requirement::Range { lower, upper } => lower >= upper,
            _ => false,
        }
    }
}

fn comparator(op: Op, v: &Version) -> Comparator {
    Comparator {
        op,
        major: v.major,
        minor: Some(v.minor),
        patch: Some(v.patch),
        pre: v.pre.clone(),
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::UpToNextMajor(v) | Requirement::UpToNextMinor(v) => {
                match self.next_bound() {
                    Some(bound) => write!(f, "{} ..< {}", v, bound),
                    None => write!(f, ">= {}", v),
                }
            }
            Requirement::Exact(v) => write!(f, "== {}", v),
            Requirement::Range { lower, upper } => write!(f, "{} ..< {}", lower, upper),
            Requirement::Branch(b) => write!(f, "branch {}", b),
            Requirement::Revision(r) => write!(f, "revision {}", r),
            Requirement::Local => write!(f, "local"),
        }
    }
}

/// A dependency on an external package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDependency {
    /// Explicit name override; the identity is derived from the location
    name: Option<String>,
    location: Location,
    requirement: Requirement,
}

impl PackageDependency {
    pub fn remote(url: Url, requirement: Requirement) -> Self {
        PackageDependency {
            name: None,
            location: Location::Remote(url),
            requirement,
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        PackageDependency {
            name: None,
            location: Location::Local(path.into()),
            requirement: Requirement::Local,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Normalized identity used to match `package:` references and index entries.
    pub fn identity(&self) -> String {
        match &self.name {
            Some(name) => identity_from_name(name),
            None => self.location.identity(),
        }
    }

    /// Name to show users: the explicit name, or the last location component.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.identity())
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn is_local(&self) -> bool {
        matches!(self.location, Location::Local(_))
    }

    /// Check whether a reference written in a target (`package: "..."` or a
    /// by-name product) refers to this dependency.
    pub fn matches_reference(&self, reference: &str) -> bool {
        let wanted = identity_from_name(reference);
        wanted == self.identity()
            || wanted == self.location.identity()
            || self
                .name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(reference))
    }
}

impl fmt::Display for PackageDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.location, self.requirement)
    }
}

/// Dependency specification as it appears in `[[dependencies]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencySpec {
    /// Remote repository URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local package directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Up to next major version from this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_to_next_minor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

/// `range = { lower = "1.0.0", upper = "2.0.0" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub lower: String,
    pub upper: String,
}

impl DependencySpec {
    /// Convert to a PackageDependency, resolving relative paths against
    /// `manifest_dir`.
    pub fn to_dependency(&self, manifest_dir: &Path) -> Result<PackageDependency, DependencyError> {
        let location = match (&self.url, &self.path) {
            (Some(url), None) => {
                let parsed = Url::parse(url).map_err(|e| DependencyError::InvalidUrl {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
                Location::Remote(parsed)
            }
            (None, Some(path)) => {
                let full = if path.is_absolute() {
                    path.clone()
                } else {
                    manifest_dir.join(path)
                };
                Location::Local(full)
            }
            _ => return Err(DependencyError::AmbiguousLocation),
        };

        let identity = match &self.name {
            Some(name) => identity_from_name(name),
            None => location.identity(),
        };

        let requested = [
            self.from.is_some(),
            self.up_to_next_minor.is_some(),
            self.exact.is_some(),
            self.range.is_some(),
            self.branch.is_some(),
            self.revision.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        let parse = |v: &str| {
            parse_version_lenient(v).ok_or_else(|| DependencyError::InvalidVersion {
                identity: identity.clone(),
                version: v.to_string(),
            })
        };

        let requirement = match &location {
            Location::Local(_) => {
                if requested > 0 {
                    return Err(DependencyError::RequirementOnPath { identity });
                }
                Requirement::Local
            }
            Location::Remote(_) => {
                if requested > 1 {
                    return Err(DependencyError::MultipleRequirements { identity });
                }

                if let Some(v) = &self.from {
                    Requirement::UpToNextMajor(parse(v)?)
                } else if let Some(v) = &self.up_to_next_minor {
                    Requirement::UpToNextMinor(parse(v)?)
                } else if let Some(v) = &self.exact {
                    Requirement::Exact(parse(v)?)
                } else if let Some(range) = &self.range {
                    Requirement::Range {
                        lower: parse(&range.lower)?,
                        upper: parse(&range.upper)?,
                    }
                } else if let Some(branch) = &self.branch {
                    Requirement::Branch(branch.clone())
                } else if let Some(rev) = &self.revision {
                    Requirement::Revision(rev.clone())
                } else {
                    return Err(DependencyError::MissingRequirement { identity });
                }
            }
        };

        Ok(PackageDependency {
            name: self.name.clone(),
            location,
            requirement,
        })
    }
}
