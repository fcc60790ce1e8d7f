//! Job types.
//!
//! A job is a single processable unit of a pipeline: a build, a test, a
//! deploy step, or a bridge that triggers a downstream pipeline.

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Error, ResourceId};

/// Status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created and waiting for its dependencies.
    #[display("created")]
    Created,
    /// Waiting for a resource group slot.
    #[display("waiting_for_resource")]
    WaitingForResource,
    /// Runner is preparing the environment.
    #[display("preparing")]
    Preparing,
    /// Ready to be picked up by a runner.
    #[display("pending")]
    Pending,
    /// Currently executing.
    #[display("running")]
    Running,
    /// Completed successfully.
    #[display("success")]
    Success,
    /// Failed.
    #[display("failed")]
    Failed,
    /// Cancelled.
    #[display("canceled")]
    Canceled,
    /// Bypassed because a dependency did not succeed. May run again after a retry.
    #[display("skipped")]
    Skipped,
    /// Waiting for someone to start it.
    #[display("manual")]
    Manual,
    /// Delayed start.
    #[display("scheduled")]
    Scheduled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 11] = [
        JobStatus::Created,
        JobStatus::WaitingForResource,
        JobStatus::Preparing,
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Success,
        JobStatus::Failed,
        JobStatus::Canceled,
        JobStatus::Skipped,
        JobStatus::Manual,
        JobStatus::Scheduled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::WaitingForResource => "waiting_for_resource",
            JobStatus::Preparing => "preparing",
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
            JobStatus::Skipped => "skipped",
            JobStatus::Manual => "manual",
            JobStatus::Scheduled => "scheduled",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown job status: {}", s)))
    }
}

/// How a job decides when it may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingType {
    /// Waits for every job in earlier stages.
    Stage,
    /// Waits only for the jobs it declares in `needs`.
    Dag,
}

impl SchedulingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingType::Stage => "stage",
            SchedulingType::Dag => "dag",
        }
    }
}

/// A job in a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier.
    pub id: ResourceId,
    /// Pipeline this job belongs to.
    pub pipeline_id: ResourceId,
    /// Job name, unique within the pipeline.
    pub name: String,
    /// Position of the job's stage in the pipeline.
    pub stage_index: u32,
    /// Current status.
    pub status: JobStatus,
    /// Names of jobs in the same pipeline this job depends on, in declaration order.
    pub needs: Vec<String>,
    pub scheduling_type: SchedulingType,
    /// A failure of this job does not block its dependents.
    pub allow_failure: bool,
    /// Optimistic lock counter, bumped on every status write.
    pub lock_version: u64,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a job with stage scheduling and no needs.
    pub fn new(
        pipeline_id: ResourceId,
        name: impl Into<String>,
        stage_index: u32,
        status: JobStatus,
    ) -> Self {
        Self {
            id: ResourceId::new(),
            pipeline_id,
            name: name.into(),
            stage_index,
            status,
            needs: Vec::new(),
            scheduling_type: SchedulingType::Stage,
            allow_failure: false,
            lock_version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Declare dependencies; a job with needs is DAG-scheduled.
    pub fn with_needs<I, S>(mut self, needs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needs = needs.into_iter().map(Into::into).collect();
        self.scheduling_type = if self.needs.is_empty() {
            SchedulingType::Stage
        } else {
            SchedulingType::Dag
        };
        self
    }

    pub fn with_allow_failure(mut self, allow_failure: bool) -> Self {
        self.allow_failure = allow_failure;
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.status == JobStatus::Skipped
    }

    /// Whether this job, in its current status, prevents dependents from running.
    pub fn blocks_dependents(&self) -> bool {
        match self.status {
            JobStatus::Failed => !self.allow_failure,
            JobStatus::Canceled | JobStatus::Skipped | JobStatus::Manual => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for status in JobStatus::ALL {
            let parsed: JobStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("finished".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&JobStatus::WaitingForResource).unwrap();
        assert_eq!(json, "\"waiting_for_resource\"");
    }

    #[test]
    fn test_with_needs_switches_scheduling_type() {
        let pipeline = ResourceId::new();
        let job = Job::new(pipeline, "test", 1, JobStatus::Skipped);
        assert_eq!(job.scheduling_type, SchedulingType::Stage);

        let job = job.with_needs(["build"]);
        assert_eq!(job.scheduling_type, SchedulingType::Dag);
        assert_eq!(job.needs, vec!["build"]);
    }

    #[test]
    fn test_blocks_dependents() {
        let pipeline = ResourceId::new();
        let failed = Job::new(pipeline, "lint", 0, JobStatus::Failed);
        assert!(failed.blocks_dependents());
        assert!(!failed.clone().with_allow_failure(true).blocks_dependents());

        assert!(Job::new(pipeline, "a", 0, JobStatus::Skipped).blocks_dependents());
        assert!(Job::new(pipeline, "b", 0, JobStatus::Manual).blocks_dependents());
        assert!(!Job::new(pipeline, "c", 0, JobStatus::Pending).blocks_dependents());
        assert!(!Job::new(pipeline, "d", 0, JobStatus::Success).blocks_dependents());
        assert!(!Job::new(pipeline, "e", 0, JobStatus::Created).blocks_dependents());
    }
}
