//! Explicit dependency graph built from `(name, needs)` pairs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Job;

/// Mapping from node name to the names it depends on.
///
/// Nodes keep the order they were inserted in, which the DAG orderer uses to
/// break ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    edges: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(name, needs)` pairs. A repeated name replaces the
    /// earlier entry's dependencies but keeps its position.
    pub fn from_pairs<I, N, D, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for (name, needs) in pairs {
            graph.insert(name, needs);
        }
        graph
    }

    /// Build a graph over `jobs`, using each job's `needs` as its edges.
    pub fn from_jobs<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        Self::from_pairs(jobs.into_iter().map(|j| (j.name.as_str(), j.needs.iter())))
    }

    pub fn insert<N, D, S>(&mut self, name: N, needs: D)
    where
        N: Into<String>,
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edges
            .insert(name.into(), needs.into_iter().map(Into::into).collect());
    }

    /// Drop dependencies on names that are not nodes of this graph but for
    /// which `is_external` holds. Dependencies that are neither nodes nor
    /// external are kept, so ordering still reports them as missing.
    pub fn drop_external(&mut self, is_external: impl Fn(&str) -> bool) {
        let nodes: Vec<String> = self.edges.keys().cloned().collect();
        for needs in self.edges.values_mut() {
            needs.retain(|dep| nodes.contains(dep) || !is_external(dep));
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    pub fn dependencies(&self, name: &str) -> Option<&[String]> {
        self.edges.get(name).map(Vec::as_slice)
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.edges.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Reverse adjacency: for each name, the nodes that depend on it, in
    /// insertion order. Names that are only referenced appear as keys too.
    pub fn dependents(&self) -> IndexMap<String, Vec<String>> {
        let mut reverse: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, needs) in &self.edges {
            for dep in needs {
                let children = reverse.entry(dep.clone()).or_default();
                if !children.contains(name) {
                    children.push(name.clone());
                }
            }
        }
        reverse
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
