//! Finds the skipped jobs to reconsider after a job is retried.

use requeue_core::{Job, Pipeline};
use std::collections::HashSet;

use crate::hierarchy::descendants;

/// Skipped jobs of `pipeline` that should be reconsidered because `job` was
/// retried.
///
/// Every skipped job in a later stage is a candidate, whether or not it
/// depends on `job`. With `use_dag_resolution` the jobs that need `job`
/// (directly or transitively) are added as well, which also covers
/// dependents in the same stage. Each job appears once, in pipeline order.
pub fn dependents_of<'a>(
    job: &Job,
    pipeline: &'a Pipeline,
    use_dag_resolution: bool,
) -> Vec<&'a Job> {
    let mut selected: HashSet<_> = pipeline
        .jobs_after_stage(job.stage_index)
        .filter(|candidate| candidate.is_skipped())
        .map(|candidate| candidate.id)
        .collect();

    if use_dag_resolution {
        selected.extend(
            descendants(pipeline, [job.name.as_str()])
                .into_iter()
                .map(|candidate| candidate.id),
        );
    }

    selected.remove(&job.id);

    pipeline
        .jobs
        .iter()
        .filter(|candidate| selected.contains(&candidate.id))
        .collect()
}
