//! Topological ordering of a dependency graph.
//!
//! Kahn's algorithm: at every step the ready node (all dependencies emitted)
//! that was inserted first is emitted next, so ties always follow input
//! order. Nodes left over when no node is ready are on or behind a cycle.

use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

use crate::DependencyGraph;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DagError {
    /// The graph contains a cycle. `path` starts and ends on the same node.
    #[error("circular dependency: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    /// A dependency names a node that is not in the graph.
    #[error("'{node}' needs '{dependency}', which is not part of the graph")]
    MissingNode { node: String, dependency: String },
}

/// Order every node of `graph` so that each node comes after all of its
/// dependencies. Fails without a partial result on a cycle or a dangling
/// dependency.
pub fn order(graph: &DependencyGraph) -> Result<Vec<String>, DagError> {
    let names: Vec<&str> = graph.nodes().collect();
    let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    // Unresolved dependency count per node, and the reverse edges
    let mut pending = vec![0usize; names.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); names.len()];

    for (node, (name, deps)) in graph.iter().enumerate() {
        let mut seen = HashSet::new();
        for dep in deps {
            let Some(&dep_index) = index.get(dep.as_str()) else {
                return Err(DagError::MissingNode {
                    node: name.to_string(),
                    dependency: dep.clone(),
                });
            };
            if seen.insert(dep_index) {
                pending[node] += 1;
                dependents[dep_index].push(node);
            }
        }
    }

    let mut ready: BTreeSet<usize> = pending
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| node)
        .collect();
    let mut sorted = Vec::with_capacity(names.len());

    while let Some(node) = ready.pop_first() {
        sorted.push(names[node].to_string());
        for &child in &dependents[node] {
            pending[child] -= 1;
            if pending[child] == 0 {
                ready.insert(child);
            }
        }
    }

    if sorted.len() < names.len() {
        return Err(DagError::Cycle {
            path: find_cycle(graph, &names, &index, &pending),
        });
    }

    Ok(sorted)
}

/// Walk unresolved dependencies from the first unresolved node until a node
/// repeats. Every unresolved node has at least one unresolved dependency, so
/// the walk always closes a cycle.
fn find_cycle(
    graph: &DependencyGraph,
    names: &[&str],
    index: &HashMap<&str, usize>,
    pending: &[usize],
) -> Vec<String> {
    let unresolved = |node: usize| pending[node] > 0;

    let Some(start) = (0..names.len()).find(|&node| unresolved(node)) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut visiting: HashMap<usize, usize> = HashMap::from([(start, 0)]);

    loop {
        let current = path[path.len() - 1];
        let next = graph
            .dependencies(names[current])
            .unwrap_or_default()
            .iter()
            .filter_map(|dep| index.get(dep.as_str()).copied())
            .find(|&dep| unresolved(dep));

        let Some(next) = next else {
            break;
        };
        if let Some(&position) = visiting.get(&next) {
            let mut cycle: Vec<String> =
                path[position..].iter().map(|&n| names[n].to_string()).collect();
            cycle.push(names[next].to_string());
            return cycle;
        }
        visiting.insert(next, path.len());
        path.push(next);
    }

    path.iter().map(|&n| names[n].to_string()).collect()
}

/// Validate that `graph` can be ordered.
pub fn check_acyclic(graph: &DependencyGraph) -> Result<(), DagError> {
    order(graph).map(|_| ())
}
