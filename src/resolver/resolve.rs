//! Resolve - the pinned package graph.
//!
//! A Resolve records one pin per package identity and which pinned package
//! requires which. Packages required directly by the manifest are roots.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Topo;
use petgraph::Direction;
use semver::Version;

/// What a package is pinned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinState {
    Version {
        version: Version,
        revision: Option<String>,
    },
    Branch {
        name: String,
        revision: Option<String>,
    },
    Revision(String),
}

impl PinState {
    pub fn version(&self) -> Option<&Version> {
        match self {
            PinState::Version { version, .. } => Some(version),
            _ => None,
        }
    }
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinState::Version { version, .. } => write!(f, "{}", version),
            PinState::Branch { name, .. } => write!(f, "branch {}", name),
            PinState::Revision(rev) => {
                write!(f, "revision {}", rev.get(..7).unwrap_or(rev))
            }
        }
    }
}

/// A package chosen by resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub identity: String,
    pub location: String,
    pub state: PinState,
}

impl fmt::Display for ResolvedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.identity, self.state)
    }
}

/// The resolved package graph.
#[derive(Debug, Clone, Default)]
pub struct Resolve {
    /// Edge a -> b means a requires b
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    packages: BTreeMap<String, ResolvedPackage>,
    roots: BTreeSet<String>,
}

impl Resolve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pinned package; a second pin for the same identity is ignored.
    pub fn add_package(&mut self, package: ResolvedPackage) {
        if self.nodes.contains_key(&package.identity) {
            return;
        }

        let node = self.graph.add_node(package.identity.clone());
        self.nodes.insert(package.identity.clone(), node);
        self.packages.insert(package.identity.clone(), package);
    }

    /// Mark a package as required directly by the manifest.
    pub fn add_root(&mut self, identity: &str) {
        if self.nodes.contains_key(identity) {
            self.roots.insert(identity.to_string());
        }
    }

    /// Record that `from` requires `to`.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if let (Some(&a), Some(&b)) = (self.nodes.get(from), self.nodes.get(to)) {
            if !self.graph.contains_edge(a, b) {
                self.graph.add_edge(a, b, ());
            }
        }
    }

    pub fn package(&self, identity: &str) -> Option<&ResolvedPackage> {
        self.packages.get(identity)
    }

    /// All pins, ordered by identity.
    pub fn packages(&self) -> impl Iterator<Item = &ResolvedPackage> {
        self.packages.values()
    }

    /// Direct manifest dependencies, ordered by identity.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.roots.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.nodes.contains_key(identity)
    }

    /// Packages `identity` requires, sorted.
    pub fn deps(&self, identity: &str) -> Vec<&str> {
        self.neighbors(identity, Direction::Outgoing)
    }

    /// Packages requiring `identity`, sorted.
    pub fn dependents(&self, identity: &str) -> Vec<&str> {
        self.neighbors(identity, Direction::Incoming)
    }

    fn neighbors(&self, identity: &str, dir: Direction) -> Vec<&str> {
        let Some(&node) = self.nodes.get(identity) else {
            return Vec::new();
        };

        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(node, dir)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out
    }

    /// Identities with dependencies before dependents.
    pub fn topological_order(&self) -> Vec<&str> {
        let mut topo = Topo::new(&self.graph);
        let mut order = Vec::new();

        while let Some(node) = topo.next(&self.graph) {
            order.push(self.graph[node].as_str());
        }

        // Topo yields a before b for an edge a -> b; requirements come first.
        order.reverse();
        order
    }
}
