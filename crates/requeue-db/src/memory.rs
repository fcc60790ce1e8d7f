//! In-memory job store.
//!
//! Holds pipelines and jobs behind a single `RwLock`. Status writes are
//! checked against the job's `lock_version` the same way the database store
//! checks them, so concurrent requeues see real conflicts.

use async_trait::async_trait;
use chrono::Utc;
use requeue_core::{
    BridgeReset, BridgeResetter, BridgeStrategy, Error, Job, JobStatus, JobStore, Pipeline,
    ResourceId, Result, SourceBridge,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

struct PipelineEntry {
    name: String,
    job_ids: Vec<ResourceId>,
    source_bridge: Option<SourceBridge>,
}

#[derive(Default)]
struct State {
    pipelines: HashMap<ResourceId, PipelineEntry>,
    jobs: HashMap<ResourceId, Job>,
}

impl State {
    fn snapshot(&self, id: ResourceId) -> Result<Pipeline> {
        let entry = self
            .pipelines
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("pipeline {}", id)))?;

        let jobs = entry
            .job_ids
            .iter()
            .filter_map(|job_id| self.jobs.get(job_id).cloned())
            .collect();

        Ok(Pipeline {
            id,
            name: entry.name.clone(),
            jobs,
            source_bridge: entry.source_bridge.clone(),
        })
    }

    fn write_status(&mut self, id: ResourceId, status: JobStatus) -> Result<Job> {
        let job = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("job {}", id)))?;
        job.status = status;
        job.lock_version += 1;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }
}

/// Job store kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `pipelines`.
    pub fn with_pipelines(pipelines: impl IntoIterator<Item = Pipeline>) -> Self {
        let mut state = State::default();
        for pipeline in pipelines {
            insert(&mut state, pipeline);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Delete a job from the store.
    pub async fn remove_job(&self, id: ResourceId) -> Option<Job> {
        let mut state = self.state.write().await;
        let job = state.jobs.remove(&id)?;
        if let Some(entry) = state.pipelines.get_mut(&job.pipeline_id) {
            entry.job_ids.retain(|j| *j != id);
        }
        Some(job)
    }
}

fn insert(state: &mut State, pipeline: Pipeline) {
    if let Some(previous) = state.pipelines.remove(&pipeline.id) {
        for job_id in previous.job_ids {
            state.jobs.remove(&job_id);
        }
    }

    let job_ids = pipeline.jobs.iter().map(|j| j.id).collect();
    for mut job in pipeline.jobs {
        job.pipeline_id = pipeline.id;
        state.jobs.insert(job.id, job);
    }
    state.pipelines.insert(
        pipeline.id,
        PipelineEntry {
            name: pipeline.name,
            job_ids,
            source_bridge: pipeline.source_bridge,
        },
    );
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn job(&self, id: ResourceId) -> Result<Job> {
        self.state
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("job {}", id)))
    }

    async fn pipeline(&self, id: ResourceId) -> Result<Pipeline> {
        self.state.read().await.snapshot(id)
    }

    async fn jobs_named(&self, pipeline_id: ResourceId, names: &[String]) -> Result<Vec<Job>> {
        let pipeline = self.state.read().await.snapshot(pipeline_id)?;
        Ok(pipeline
            .jobs
            .into_iter()
            .filter(|j| names.contains(&j.name))
            .collect())
    }

    async fn update_status(
        &self,
        id: ResourceId,
        expected_version: u64,
        status: JobStatus,
    ) -> Result<Job> {
        let mut state = self.state.write().await;
        let current = state
            .jobs
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("job {}", id)))?;

        if current.lock_version != expected_version {
            return Err(Error::StaleVersion {
                job: id,
                expected: expected_version,
                actual: current.lock_version,
            });
        }

        state.write_status(id, status)
    }
}

#[async_trait]
impl BridgeResetter for MemoryStore {
    async fn reset_source_bridge(&self, pipeline_id: ResourceId) -> Result<BridgeReset> {
        let mut state = self.state.write().await;
        let entry = state
            .pipelines
            .get(&pipeline_id)
            .ok_or_else(|| Error::NotFound(format!("pipeline {}", pipeline_id)))?;

        let Some(bridge) = entry.source_bridge.clone() else {
            return Ok(BridgeReset::NoBridge);
        };
        if bridge.strategy != BridgeStrategy::Depend {
            return Ok(BridgeReset::NotDependent);
        }

        let bridge = state.write_status(bridge.job_id, JobStatus::Pending)?;
        Ok(BridgeReset::Reset { bridge })
    }
}
