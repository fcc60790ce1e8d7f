//! Pipeline definitions.

use serde::{Deserialize, Serialize};

use crate::{Job, JobStatus, ResourceId};

/// A CI pipeline: an ordered set of jobs grouped into stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Unique identifier.
    pub id: ResourceId,
    /// Pipeline name (e.g., "my-service").
    pub name: String,
    /// Jobs in definition order.
    pub jobs: Vec<Job>,
    /// The upstream job that triggered this pipeline, if any.
    pub source_bridge: Option<SourceBridge>,
}

/// Reference to a bridge job in an upstream pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBridge {
    /// Pipeline that owns the bridge job.
    pub pipeline_id: ResourceId,
    /// The bridge job itself.
    pub job_id: ResourceId,
    pub strategy: BridgeStrategy,
}

/// How a bridge tracks its downstream pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeStrategy {
    /// Fire and forget.
    None,
    /// The bridge mirrors the downstream pipeline's status.
    Depend,
}

impl BridgeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeStrategy::None => "none",
            BridgeStrategy::Depend => "depend",
        }
    }
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(),
            name: name.into(),
            jobs: Vec::new(),
            source_bridge: None,
        }
    }

    /// Add a job, reassigning it to this pipeline.
    pub fn push(&mut self, mut job: Job) -> ResourceId {
        job.pipeline_id = self.id;
        let id = job.id;
        self.jobs.push(job);
        id
    }

    pub fn job(&self, id: ResourceId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn job_named(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Jobs whose stage comes strictly after `stage_index`.
    pub fn jobs_after_stage(&self, stage_index: u32) -> impl Iterator<Item = &Job> {
        self.jobs
            .iter()
            .filter(move |j| j.stage_index > stage_index)
    }

    pub fn jobs_with_status(&self, status: JobStatus) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(move |j| j.status == status)
    }

    pub fn skipped_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs_with_status(JobStatus::Skipped)
    }

    /// Whether resetting the source bridge should have any effect.
    pub fn bridge_waiting(&self) -> bool {
        self.source_bridge
            .as_ref()
            .is_some_and(|b| b.strategy == BridgeStrategy::Depend)
    }
}
