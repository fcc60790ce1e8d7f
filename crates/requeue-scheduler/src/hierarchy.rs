//! Transitive dependents through the `needs` graph.

use requeue_core::{DependencyGraph, Job, Pipeline};
use std::collections::{HashSet, VecDeque};

/// Skipped jobs of `pipeline` that need any of `roots`, directly or through
/// other skipped jobs.
///
/// Only skipped jobs are walked: a job in any other status has either run
/// already or is not reachable yet, so the chain stops there. A root is only
/// part of the result when it is itself a dependent of another root. Results
/// come back in pipeline order.
pub fn descendants<'a, 'r>(
    pipeline: &'a Pipeline,
    roots: impl IntoIterator<Item = &'r str>,
) -> Vec<&'a Job> {
    let children = DependencyGraph::from_jobs(pipeline.skipped_jobs()).dependents();

    let mut found: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = roots.into_iter().collect();

    while let Some(name) = queue.pop_front() {
        let Some(dependents) = children.get(name) else {
            continue;
        };
        for child in dependents {
            if found.insert(child.as_str()) {
                queue.push_back(child.as_str());
            }
        }
    }

    pipeline
        .skipped_jobs()
        .filter(|job| found.contains(job.name.as_str()))
        .collect()
}
