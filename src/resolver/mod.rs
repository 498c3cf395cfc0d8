//! Dependency resolution.
//!
//! This module implements PubGrub-based version resolution for package
//! dependencies. The resolver is pure and deterministic: every release it
//! may pick is gathered from a [`Source`] before solving starts.
//!
//! Branch and revision dependencies of the root package are pinned as
//! declared and take precedence over versioned requirements on the same
//! package further down the graph. Local path dependencies are never pinned.

pub mod errors;
pub mod resolve;
pub mod version;

pub use errors::ResolveError;
pub use resolve::{PinState, Resolve, ResolvedPackage};

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::error::Error as StdError;
use std::fmt;

use pubgrub::{
    DefaultStringReporter, Dependencies, DependencyProvider, PackageResolutionStatistics, Range,
    Reporter,
};
use semver::Version;

use crate::core::dependency::identity_from_name;
use crate::core::{Location, PackageDependency, Requirement};
use crate::sources::{Release, Source};

/// A package identifier for PubGrub resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolverPackage {
    /// The package being resolved, whose dependencies come from its manifest
    Root,
    Package(String),
}

impl fmt::Display for ResolverPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverPackage::Root => write!(f, "root"),
            ResolverPackage::Package(identity) => write!(f, "{}", identity),
        }
    }
}

/// Error raised from inside the dependency provider.
#[derive(Debug)]
pub struct ResolverError(String);

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for ResolverError {}

/// Version the synthetic root package is solved at.
const ROOT_VERSION: Version = Version::new(0, 0, 0);

/// Dependency provider for PubGrub resolution.
pub struct SwiftResolver {
    /// Available releases by identity, newest first
    releases: HashMap<String, Vec<Release>>,

    /// Every identity the source knows, for suggestions
    known: Vec<String>,

    /// The manifest's package dependencies
    root_deps: Vec<PackageDependency>,

    /// Identities pinned by a root branch or revision requirement
    unversioned: HashSet<String>,

    /// Versions to keep when still allowed, usually from Package.resolved
    preferred: HashMap<String, Version>,

    /// Identities required by some release that the source does not know
    missing: BTreeSet<String>,
}

impl SwiftResolver {
    /// Create a resolver for the given manifest dependencies.
    pub fn new(root_deps: Vec<PackageDependency>) -> Self {
        let unversioned = root_deps
            .iter()
            .filter(|d| !d.is_local() && !d.requirement().is_version_based())
            .map(PackageDependency::identity)
            .collect();

        SwiftResolver {
            releases: HashMap::new(),
            known: Vec::new(),
            root_deps,
            unversioned,
            preferred: HashMap::new(),
            missing: BTreeSet::new(),
        }
    }

    /// Create a resolver and load every release reachable from the root
    /// dependencies.
    pub fn from_source(root_deps: Vec<PackageDependency>, source: &dyn Source) -> Self {
        let mut resolver = SwiftResolver::new(root_deps);
        resolver.known = source.identities();

        let mut queue: VecDeque<String> = resolver
            .root_deps
            .iter()
            .filter(|d| d.requirement().is_version_based())
            .map(PackageDependency::identity)
            .collect();
        let roots: HashSet<String> = queue.iter().cloned().collect();
        let mut seen = HashSet::new();

        while let Some(identity) = queue.pop_front() {
            if !seen.insert(identity.clone()) {
                continue;
            }

            let releases = source.query(&identity);
            if releases.is_empty() && !roots.contains(&identity) {
                resolver.missing.insert(identity.clone());
            }
            for release in &releases {
                queue.extend(
                    release
                        .dependencies
                        .iter()
                        .filter(|d| d.requirement().is_version_based())
                        .map(PackageDependency::identity),
                );
            }
            resolver.add_releases(releases);
        }

        tracing::debug!(
            "loaded {} packages from {} for resolution",
            resolver.releases.len(),
            source.name()
        );

        resolver
    }

    /// Add available releases for resolution.
    pub fn add_releases(&mut self, releases: Vec<Release>) {
        for release in releases {
            let list = self.releases.entry(release.identity.clone()).or_default();
            if !list.iter().any(|r| r.version == release.version) {
                list.push(release);
            }
        }

        for list in self.releases.values_mut() {
            list.sort_by(|a, b| b.version.cmp(&a.version));
        }
    }

    /// Keep `version` of a package if the requirements still allow it.
    pub fn prefer(&mut self, identity: &str, version: Version) {
        self.preferred.insert(identity_from_name(identity), version);
    }

    fn releases_of(&self, identity: &str) -> &[Release] {
        self.releases.get(identity).map(Vec::as_slice).unwrap_or(&[])
    }

    fn release(&self, identity: &str, version: &Version) -> Option<&Release> {
        self.releases_of(identity).iter().find(|r| &r.version == version)
    }

    /// Requirements PubGrub should see for a list of dependencies.
    ///
    /// Entries naming the same identity are intersected, so every one of
    /// them holds for the chosen version.
    fn constraints(&self, deps: &[PackageDependency]) -> Vec<(ResolverPackage, Range<Version>)> {
        let mut merged: Vec<(ResolverPackage, Range<Version>)> = Vec::new();

        for dep in deps {
            let identity = dep.identity();
            if self.unversioned.contains(&identity) {
                continue;
            }
            let Some(range) = version::requirement_to_range(dep.requirement()) else {
                continue;
            };

            let package = ResolverPackage::Package(identity);
            match merged.iter_mut().find(|(p, _)| *p == package) {
                Some((_, existing)) => *existing = existing.intersection(&range),
                None => merged.push((package, range)),
            }
        }

        merged
    }

    /// Report root requirements that can never be met before solving, so
    /// the error names the package instead of a derivation tree.
    fn check_root_requirements(&self) -> Result<(), ResolveError> {
        let mut by_identity: Vec<(String, Vec<&PackageDependency>)> = Vec::new();
        for dep in &self.root_deps {
            let identity = dep.identity();
            match by_identity.iter_mut().find(|(id, _)| *id == identity) {
                Some((_, deps)) => deps.push(dep),
                None => by_identity.push((identity, vec![dep])),
            }
        }

        if let Some((identity, deps)) = by_identity.iter().find(|(_, deps)| deps.len() > 1) {
            return Err(ResolveError::DuplicateDependency {
                package: identity.clone(),
                requirements: deps
                    .iter()
                    .map(|d| format!("{} ({})", d.location(), d.requirement()))
                    .collect(),
            });
        }

        for (package, range) in self.constraints(&self.root_deps) {
            let ResolverPackage::Package(identity) = package else {
                continue;
            };
            let releases = self.releases_of(&identity);

            if releases.is_empty() {
                return Err(ResolveError::PackageNotFound {
                    suggestions: similar_names(&identity, &self.known),
                    package: identity,
                });
            }

            if !releases.iter().any(|r| range.contains(&r.version)) {
                let requirement = by_identity
                    .iter()
                    .filter(|(id, _)| *id == identity)
                    .flat_map(|(_, deps)| deps.iter().map(|d| d.requirement().to_string()))
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(ResolveError::NoMatchingVersion {
                    package: identity,
                    requirement,
                    available: releases.iter().map(|r| r.version.to_string()).collect(),
                });
            }
        }

        Ok(())
    }

    /// Resolve dependencies and return the pinned graph.
    pub fn resolve(self) -> Result<Resolve, ResolveError> {
        self.check_root_requirements()?;

        let solution = match pubgrub::resolve(&self, ResolverPackage::Root, ROOT_VERSION) {
            Ok(solution) => solution,
            Err(pubgrub::PubGrubError::NoSolution(tree)) => {
                let missing = tree
                    .packages()
                    .into_iter()
                    .filter_map(|p| match p {
                        ResolverPackage::Package(identity) if self.missing.contains(identity) => {
                            Some(identity.clone())
                        }
                        _ => None,
                    })
                    .min();
                if let Some(package) = missing {
                    return Err(ResolveError::PackageNotFound {
                        suggestions: similar_names(&package, &self.known),
                        package,
                    });
                }
                return Err(ResolveError::Unsatisfiable {
                    report: DefaultStringReporter::report(&tree),
                });
            }
            Err(e) => {
                return Err(ResolveError::Unsatisfiable {
                    report: format!("{:?}", e),
                });
            }
        };

        let mut resolve = Resolve::new();

        for (package, version) in solution {
            let ResolverPackage::Package(identity) = package else {
                continue;
            };
            if let Some(release) = self.release(&identity, &version) {
                resolve.add_package(ResolvedPackage {
                    identity,
                    location: release.location.clone(),
                    state: PinState::Version {
                        version,
                        revision: release.revision.clone(),
                    },
                });
            }
        }

        for dep in &self.root_deps {
            let state = match dep.requirement() {
                Requirement::Branch(name) => PinState::Branch {
                    name: name.clone(),
                    revision: None,
                },
                Requirement::Revision(rev) => PinState::Revision(rev.clone()),
                _ => continue,
            };
            resolve.add_package(ResolvedPackage {
                identity: dep.identity(),
                location: dep.location().as_string(),
                state,
            });
        }

        for dep in &self.root_deps {
            let identity = dep.identity();
            if let (Location::Remote(_), Some(pinned)) = (dep.location(), resolve.package(&identity))
            {
                let wanted = dep.location().as_string();
                if !same_location(&wanted, &pinned.location) {
                    return Err(ResolveError::ConflictingLocations {
                        package: identity,
                        locations: vec![wanted, pinned.location.clone()],
                    });
                }
            }
            resolve.add_root(&identity);
        }

        let pinned: Vec<(String, Version)> = resolve
            .packages()
            .filter_map(|p| p.state.version().map(|v| (p.identity.clone(), v.clone())))
            .collect();
        for (identity, version) in pinned {
            if let Some(release) = self.release(&identity, &version) {
                for dep in &release.dependencies {
                    resolve.add_edge(&identity, &dep.identity());
                }
            }
        }

        tracing::debug!("resolved {} packages", resolve.len());

        Ok(resolve)
    }
}

impl DependencyProvider for SwiftResolver {
    type P = ResolverPackage;
    type V = Version;
    type VS = Range<Version>;
    type M = String;
    type Err = ResolverError;
    type Priority = u32;

    fn prioritize(
        &self,
        package: &Self::P,
        _range: &Self::VS,
        _package_conflicts_counts: &PackageResolutionStatistics,
    ) -> Self::Priority {
        // Higher priority is decided first; fewer candidates means fewer
        // backtracking points.
        match package {
            ResolverPackage::Root => u32::MAX,
            ResolverPackage::Package(identity) => {
                let count = self.releases_of(identity).len().min(1000) as u32;
                1000 - count
            }
        }
    }

    fn choose_version(
        &self,
        package: &Self::P,
        range: &Self::VS,
    ) -> Result<Option<Self::V>, Self::Err> {
        let identity = match package {
            ResolverPackage::Root => {
                return Ok(range.contains(&ROOT_VERSION).then_some(ROOT_VERSION));
            }
            ResolverPackage::Package(identity) => identity,
        };

        if let Some(version) = self.preferred.get(identity) {
            if range.contains(version) && self.release(identity, version).is_some() {
                return Ok(Some(version.clone()));
            }
        }

        let candidates = self.releases_of(identity);
        let stable = candidates
            .iter()
            .find(|r| r.version.pre.is_empty() && range.contains(&r.version));
        let any = || candidates.iter().find(|r| range.contains(&r.version));

        Ok(stable.or_else(any).map(|r| r.version.clone()))
    }

    fn get_dependencies(
        &self,
        package: &Self::P,
        version: &Self::V,
    ) -> Result<Dependencies<Self::P, Self::VS, Self::M>, Self::Err> {
        let deps = match package {
            ResolverPackage::Root => &self.root_deps,
            ResolverPackage::Package(identity) => match self.release(identity, version) {
                Some(release) => &release.dependencies,
                None => {
                    return Ok(Dependencies::Unavailable(format!(
                        "{} {} is not in the package index",
                        identity, version
                    )))
                }
            },
        };

        Ok(Dependencies::Available(
            self.constraints(deps).into_iter().collect(),
        ))
    }
}

fn same_location(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        let s = s.trim_end_matches('/');
        s.strip_suffix(".git").unwrap_or(s).to_lowercase()
    };
    normalize(a) == normalize(b)
}

/// Known identities close to `wanted`, for "did you mean" hints.
fn similar_names(wanted: &str, known: &[String]) -> Vec<String> {
    let mut out: Vec<String> = known
        .iter()
        .filter(|k| {
            k.as_str() != wanted
                && (k.contains(wanted) || wanted.contains(k.as_str()) || edit_distance(wanted, k) <= 2)
        })
        .cloned()
        .collect();
    out.sort();
    out.truncate(3);
    out
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut cur = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        prev = cur;
    }

    prev[b.len()]
}
