//! Processing order for dependent jobs.

use requeue_core::dag::{self, DagError};
use requeue_core::{DependencyGraph, Job, Pipeline};
use std::collections::HashMap;

/// Order `candidates` for processing: by ascending stage, and within a stage
/// so that every job comes after the candidates it needs.
///
/// Needs on pipeline jobs outside the candidate set are not ordering
/// constraints; those jobs are not being processed. A need on a name the
/// pipeline does not know, or a cycle among candidates, is an error and
/// nothing is returned.
pub fn order_for_processing<'a>(
    mut candidates: Vec<&'a Job>,
    pipeline: &Pipeline,
) -> Result<Vec<&'a Job>, DagError> {
    candidates.sort_by_key(|job| job.stage_index);

    let mut graph = DependencyGraph::from_jobs(candidates.iter().copied());
    graph.drop_external(|name| pipeline.job_named(name).is_some());

    let rank: HashMap<String, usize> = dag::order(&graph)?
        .into_iter()
        .enumerate()
        .map(|(position, name)| (name, position))
        .collect();

    candidates.sort_by_key(|job| {
        (
            job.stage_index,
            rank.get(&job.name).copied().unwrap_or(usize::MAX),
        )
    });

    Ok(candidates)
}
