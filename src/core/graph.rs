//! Target dependency graph.
//!
//! Only edges between targets of the same package are part of the graph;
//! product dependencies on external packages are leaves handled by the
//! resolver.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use thiserror::Error;

use crate::core::manifest::{Manifest, ResolvedTargetDependency};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cycle in target dependencies: {}", .0.join(" -> "))]
pub struct CycleError(pub Vec<String>);

/// Directed graph of targets; an edge `a -> b` means `a` depends on `b`.
#[derive(Debug, Clone)]
pub struct TargetGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl TargetGraph {
    /// Build the graph from a manifest.
    ///
    /// Dependencies that do not resolve to a local target are skipped; the
    /// validator reports them separately.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        for target in &manifest.targets {
            if !nodes.contains_key(&target.name) {
                let node = graph.add_node(target.name.clone());
                nodes.insert(target.name.clone(), node);
            }
        }

        for target in &manifest.targets {
            let from = nodes[&target.name];
            for dep in &target.dependencies {
                if let ResolvedTargetDependency::Target(dep_target) =
                    manifest.resolve_target_dependency(dep)
                {
                    let to = nodes[&dep_target.name];
                    if !graph.contains_edge(from, to) {
                        graph.add_edge(from, to, ());
                    }
                }
            }
        }

        TargetGraph { graph, nodes }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Find one dependency cycle, if any.
    ///
    /// The returned path starts and ends with the same target, e.g.
    /// `["A", "B", "A"]`.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        for scc in tarjan_scc(&self.graph) {
            let is_cycle = scc.len() > 1
                || scc
                    .first()
                    .is_some_and(|&n| self.graph.contains_edge(n, n));
            if !is_cycle {
                continue;
            }

            let members: BTreeSet<NodeIndex> = scc.iter().copied().collect();
            let start = *members.iter().next()?;
            return Some(self.walk_cycle(start, &members));
        }
        None
    }

    /// Follow edges inside one strongly connected component until we return
    /// to a node already on the path.
    fn walk_cycle(&self, start: NodeIndex, members: &BTreeSet<NodeIndex>) -> Vec<String> {
        let mut path = vec![start];
        let mut current = start;

        loop {
            let mut next: Vec<NodeIndex> = self
                .graph
                .neighbors(current)
                .filter(|n| members.contains(n))
                .collect();
            next.sort();

            let Some(&step) = next.first() else {
                break;
            };

            if let Some(pos) = path.iter().position(|&n| n == step) {
                let mut cycle: Vec<String> =
                    path[pos..].iter().map(|&n| self.graph[n].clone()).collect();
                cycle.push(self.graph[step].clone());
                return cycle;
            }

            path.push(step);
            current = step;
        }

        path.iter().map(|&n| self.graph[n].clone()).collect()
    }

    /// Targets in build order (dependencies before dependents).
    pub fn topological_order(&self) -> Result<Vec<String>, CycleError> {
        match toposort(&self.graph, None) {
            Ok(mut order) => {
                // toposort yields dependents first since edges point at dependencies
                order.reverse();
                Ok(order.into_iter().map(|n| self.graph[n].clone()).collect())
            }
            Err(_) => Err(CycleError(self.find_cycle().unwrap_or_default())),
        }
    }

    /// Direct dependencies of a target, sorted by name.
    pub fn direct_deps(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Targets that depend directly on `name`, sorted by name.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(&node) = self.nodes.get(name) else {
            return Vec::new();
        };

        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// All targets reachable from `name`, excluding `name` itself.
    pub fn transitive_deps(&self, name: &str) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        let Some(&start) = self.nodes.get(name) else {
            return result;
        };

        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            if node != start {
                result.insert(self.graph[node].clone());
            }
        }
        result
    }

    /// Render the graph in Graphviz dot format.
    pub fn to_dot(&self) -> String {
        format!("{:?}", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]))
    }
}
