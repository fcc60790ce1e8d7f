//! PostgreSQL job store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use requeue_core::{
    BridgeReset, BridgeResetter, BridgeStrategy, Error, Job, JobStatus, JobStore, Pipeline,
    ResourceId, Result, SchedulingType, SourceBridge,
};
use sqlx::PgPool;

use crate::{DbError, DbResult};

const JOB_COLUMNS: &str = "id, pipeline_id, name, stage_idx, status, needs, scheduling_type, \
                           allow_failure, lock_version, updated_at";

/// A job record in the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct JobRow {
    id: uuid::Uuid,
    pipeline_id: uuid::Uuid,
    name: String,
    stage_idx: i32,
    status: String,
    needs: Vec<String>,
    scheduling_type: String,
    allow_failure: bool,
    lock_version: i64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = DbError;

    fn try_from(row: JobRow) -> DbResult<Self> {
        let status = row
            .status
            .parse::<JobStatus>()
            .map_err(|e| DbError::InvalidRow(e.to_string()))?;
        let scheduling_type = match row.scheduling_type.as_str() {
            "stage" => SchedulingType::Stage,
            "dag" => SchedulingType::Dag,
            other => {
                return Err(DbError::InvalidRow(format!(
                    "unknown scheduling type: {}",
                    other
                )));
            }
        };

        Ok(Job {
            id: row.id.into(),
            pipeline_id: row.pipeline_id.into(),
            name: row.name,
            stage_index: u32::try_from(row.stage_idx)
                .map_err(|_| DbError::InvalidRow(format!("negative stage: {}", row.stage_idx)))?,
            status,
            needs: row.needs,
            scheduling_type,
            allow_failure: row.allow_failure,
            lock_version: u64::try_from(row.lock_version).map_err(|_| {
                DbError::InvalidRow(format!("negative lock version: {}", row.lock_version))
            })?,
            updated_at: row.updated_at,
        })
    }
}

/// A pipeline record in the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PipelineRow {
    id: uuid::Uuid,
    name: String,
    source_pipeline_id: Option<uuid::Uuid>,
    source_job_id: Option<uuid::Uuid>,
    source_strategy: String,
}

impl PipelineRow {
    fn source_bridge(&self) -> Option<SourceBridge> {
        let (pipeline_id, job_id) = (self.source_pipeline_id?, self.source_job_id?);
        let strategy = match self.source_strategy.as_str() {
            "depend" => BridgeStrategy::Depend,
            _ => BridgeStrategy::None,
        };
        Some(SourceBridge {
            pipeline_id: pipeline_id.into(),
            job_id: job_id.into(),
            strategy,
        })
    }
}

/// Why a conditional status update matched no row: the job is gone, or
/// another writer bumped its version first.
fn unmatched_update(id: ResourceId, expected_version: u64, current: Option<&Job>) -> Error {
    match current {
        None => Error::NotFound(format!("job {}", id)),
        Some(job) => Error::StaleVersion {
            job: id,
            expected: expected_version,
            actual: job.lock_version,
        },
    }
}

fn to_jobs(rows: Vec<JobRow>) -> DbResult<Vec<Job>> {
    rows.into_iter().map(Job::try_from).collect()
}

/// PostgreSQL implementation of JobStore.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist pipelines and their jobs in one transaction. Source bridges
    /// may point at any pipeline of the batch.
    pub async fn insert_pipelines(&self, pipelines: &[Pipeline]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for pipeline in pipelines {
            let bridge = pipeline.source_bridge.as_ref();
            sqlx::query(
                r#"
                INSERT INTO ci_pipelines
                    (id, name, source_pipeline_id, source_job_id, source_strategy)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(pipeline.id.as_uuid())
            .bind(&pipeline.name)
            .bind(bridge.map(|b| *b.pipeline_id.as_uuid()))
            .bind(bridge.map(|b| *b.job_id.as_uuid()))
            .bind(bridge.map(|b| b.strategy.as_str()).unwrap_or("none"))
            .execute(&mut *tx)
            .await?;

            for (position, job) in pipeline.jobs.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO ci_jobs (id, pipeline_id, name, stage_idx, position, status, needs,
                                         scheduling_type, allow_failure, lock_version, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    "#,
                )
                .bind(job.id.as_uuid())
                .bind(pipeline.id.as_uuid())
                .bind(&job.name)
                .bind(job.stage_index as i32)
                .bind(position as i32)
                .bind(job.status.as_str())
                .bind(&job.needs)
                .bind(job.scheduling_type.as_str())
                .bind(job.allow_failure)
                .bind(job.lock_version as i64)
                .bind(job.updated_at)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_job(&self, id: ResourceId) -> DbResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM ci_jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Job::try_from).transpose()
    }

    async fn fetch_job(&self, id: ResourceId) -> DbResult<Job> {
        self.find_job(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("job {}", id)))
    }

    async fn fetch_pipeline(&self, id: ResourceId) -> DbResult<Pipeline> {
        let row = sqlx::query_as::<_, PipelineRow>(
            "SELECT id, name, source_pipeline_id, source_job_id, source_strategy \
             FROM ci_pipelines WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("pipeline {}", id)))?;

        let jobs = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM ci_jobs WHERE pipeline_id = $1 ORDER BY stage_idx, position",
            JOB_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(Pipeline {
            id: row.id.into(),
            source_bridge: row.source_bridge(),
            name: row.name,
            jobs: to_jobs(jobs)?,
        })
    }

    async fn write_status(
        &self,
        id: ResourceId,
        expected_version: Option<u64>,
        status: JobStatus,
    ) -> DbResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE ci_jobs
            SET status = $2, lock_version = lock_version + 1, updated_at = NOW()
            WHERE id = $1 AND ($3::BIGINT IS NULL OR lock_version = $3)
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(expected_version.map(|v| v as i64))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn job(&self, id: ResourceId) -> Result<Job> {
        Ok(self.fetch_job(id).await?)
    }

    async fn pipeline(&self, id: ResourceId) -> Result<Pipeline> {
        Ok(self.fetch_pipeline(id).await?)
    }

    async fn jobs_named(&self, pipeline_id: ResourceId, names: &[String]) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM ci_jobs WHERE pipeline_id = $1 AND name = ANY($2) \
             ORDER BY stage_idx, position",
            JOB_COLUMNS
        ))
        .bind(pipeline_id.as_uuid())
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(to_jobs(rows)?)
    }

    async fn update_status(
        &self,
        id: ResourceId,
        expected_version: u64,
        status: JobStatus,
    ) -> Result<Job> {
        if let Some(job) = self.write_status(id, Some(expected_version), status).await? {
            return Ok(job);
        }

        let current = self.find_job(id).await?;
        Err(unmatched_update(id, expected_version, current.as_ref()))
    }
}

#[async_trait]
impl BridgeResetter for PgJobStore {
    async fn reset_source_bridge(&self, pipeline_id: ResourceId) -> Result<BridgeReset> {
        let row = sqlx::query_as::<_, PipelineRow>(
            "SELECT id, name, source_pipeline_id, source_job_id, source_strategy \
             FROM ci_pipelines WHERE id = $1",
        )
        .bind(pipeline_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| Error::NotFound(format!("pipeline {}", pipeline_id)))?;

        let Some(bridge) = row.source_bridge() else {
            return Ok(BridgeReset::NoBridge);
        };
        if bridge.strategy != BridgeStrategy::Depend {
            return Ok(BridgeReset::NotDependent);
        }

        let bridge = self
            .write_status(bridge.job_id, None, JobStatus::Pending)
            .await?
            .ok_or_else(|| Error::NotFound(format!("bridge job {}", bridge.job_id)))?;
        Ok(BridgeReset::Reset { bridge })
    }
}
