//! Retry a job against a fixture loaded into memory or into Postgres.

use anyhow::{Context, Result, anyhow};
use requeue_config::{RequeueSettings, parse_settings};
use requeue_core::{BridgeResetter, JobStatus, JobStore, Pipeline, ResourceId};
use requeue_db::{MemoryStore, PgJobStore, create_pool, run_migrations};
use requeue_scheduler::{BridgeOutcome, JobOutcome, RequeueOrchestrator, RequeueReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::{load_fixture, select_pipeline};

pub struct RetryOptions {
    pub pipeline: Option<String>,
    pub job: String,
    pub legacy: bool,
    pub settings: Option<PathBuf>,
    pub database_url: Option<String>,
    pub json: bool,
}

pub async fn run(path: &Path, options: RetryOptions) -> Result<()> {
    let fixture = load_fixture(path)?;
    let pipeline = select_pipeline(&fixture, options.pipeline.as_deref())?;
    let job_id = pipeline
        .job_named(&options.job)
        .ok_or_else(|| anyhow!("no job named '{}' in pipeline '{}'", options.job, pipeline.name))?
        .id;

    let mut settings = load_settings(options.settings.as_deref())?;
    if options.legacy {
        settings.use_dag_resolution = false;
    }

    match options.database_url.as_deref() {
        Some(database_url) => {
            info!("Connecting to database...");
            let pool = create_pool(database_url).await?;
            run_migrations(&pool).await?;
            let store = PgJobStore::new(pool);
            store
                .insert_pipelines(&fixture.pipelines)
                .await
                .context("failed to load fixture into the database")?;
            info!("Database connected");
            retry(Arc::new(store), &fixture.pipelines, job_id, settings, options.json).await
        }
        None => {
            let store = MemoryStore::with_pipelines(fixture.pipelines.clone());
            retry(Arc::new(store), &fixture.pipelines, job_id, settings, options.json).await
        }
    }
}

async fn retry<S>(
    store: Arc<S>,
    pipelines: &[Pipeline],
    job_id: ResourceId,
    settings: RequeueSettings,
    json: bool,
) -> Result<()>
where
    S: JobStore + BridgeResetter + 'static,
{
    // A retry starts a new attempt of the job
    let job = store.job(job_id).await?;
    store
        .update_status(job_id, job.lock_version, JobStatus::Pending)
        .await
        .with_context(|| format!("failed to mark '{}' pending", job.name))?;
    info!(job = %job.name, previous = %job.status, "Retrying job");

    let orchestrator = RequeueOrchestrator::new(store.clone(), store.clone(), settings);
    let report = orchestrator.requeue(job_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, 0);
    }

    println!();
    for pipeline in pipelines {
        let snapshot = store.pipeline(pipeline.id).await?;
        println!("{}", snapshot.name);
        for job in &snapshot.jobs {
            println!("  {:<24} {}", job.name, job.status);
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<RequeueSettings> {
    let Some(path) = path else {
        return Ok(RequeueSettings::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_settings(&content).with_context(|| format!("invalid settings {}", path.display()))
}

fn print_report(report: &RequeueReport, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{}{} / {}", indent, report.pipeline, report.job);

    for processed in &report.processed {
        match &processed.outcome {
            JobOutcome::Requeued { status } => {
                println!("{}  {:<24} -> {}", indent, processed.name, status);
            }
            JobOutcome::Unchanged { blocking } => {
                println!(
                    "{}  {:<24} blocked by {}",
                    indent,
                    processed.name,
                    blocking.join(", ")
                );
            }
        }
    }
    for failure in &report.failures {
        println!("{}  {:<24} failed: {:?}", indent, failure.name, failure.reason);
    }

    match &report.bridge {
        BridgeOutcome::NoBridge | BridgeOutcome::NotDependent => {}
        BridgeOutcome::Reset { bridge } => println!("{}  bridge {} reset", indent, bridge),
        BridgeOutcome::CascadeFailed { bridge, message } => {
            println!("{}  bridge {} reset, upstream failed: {}", indent, bridge, message);
        }
        BridgeOutcome::Failed { message } => {
            println!("{}  bridge reset failed: {}", indent, message);
        }
    }

    if let Some(upstream) = &report.upstream {
        print_report(upstream, depth + 1);
    }
}
