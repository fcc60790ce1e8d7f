//! Traits for the job store and the bridge subsystem.
//!
//! The scheduler never owns job data. It reads snapshots through [`JobStore`]
//! and writes statuses with an optimistic-lock check.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Job, JobStatus, Pipeline, ResourceId, Result};

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetch a job.
    async fn job(&self, id: ResourceId) -> Result<Job>;

    /// Fetch a snapshot of a pipeline and all of its jobs.
    async fn pipeline(&self, id: ResourceId) -> Result<Pipeline>;

    /// Fetch the jobs of a pipeline with the given names. Unknown names are
    /// left out of the result.
    async fn jobs_named(&self, pipeline_id: ResourceId, names: &[String]) -> Result<Vec<Job>>;

    /// Write a job's status if its lock version still equals
    /// `expected_version`. Returns the updated job, or
    /// [`Error::StaleVersion`](crate::Error::StaleVersion) when another
    /// writer got there first.
    async fn update_status(
        &self,
        id: ResourceId,
        expected_version: u64,
        status: JobStatus,
    ) -> Result<Job>;
}

/// What happened when the source bridge of a pipeline was reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BridgeReset {
    /// The pipeline was not triggered by a bridge.
    NoBridge,
    /// The bridge does not mirror downstream status, so nothing changed.
    NotDependent,
    /// The bridge was moved back to pending.
    Reset { bridge: Job },
}

#[async_trait]
pub trait BridgeResetter: Send + Sync {
    /// Reset the status of the bridge that triggered `pipeline_id`.
    async fn reset_source_bridge(&self, pipeline_id: ResourceId) -> Result<BridgeReset>;
}
