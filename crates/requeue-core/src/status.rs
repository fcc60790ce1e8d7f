//! The `process` status transition.
//!
//! Processing re-evaluates a skipped job after something upstream of it was
//! retried. The job becomes `created` (eligible, waiting on its needs) when
//! none of its needs block it, and stays `skipped` otherwise.

use serde::{Deserialize, Serialize};

use crate::{Error, Job, JobStatus, Result};

/// Result of evaluating the `process` transition for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Transition {
    /// The job should move to the given status.
    Requeue { to: JobStatus },
    /// The job stays skipped because these needs still block it.
    Blocked { blocking: Vec<String> },
}

/// Evaluate `process` for `job`, given the current state of the jobs it needs.
///
/// `needed` may contain jobs the caller fetched for other reasons; only those
/// named in `job.needs` are considered. A need with no matching job is treated
/// as blocking.
pub fn process(job: &Job, needed: &[Job]) -> Result<Transition> {
    if job.status != JobStatus::Skipped {
        return Err(Error::UnexpectedState {
            job: job.id,
            status: job.status,
            expected: JobStatus::Skipped,
        });
    }

    let blocking: Vec<String> = job
        .needs
        .iter()
        .filter(|name| {
            needed
                .iter()
                .find(|candidate| candidate.name == **name)
                .map(|candidate| candidate.blocks_dependents())
                .unwrap_or(true)
        })
        .cloned()
        .collect();

    if blocking.is_empty() {
        Ok(Transition::Requeue {
            to: JobStatus::Created,
        })
    } else {
        Ok(Transition::Blocked { blocking })
    }
}
