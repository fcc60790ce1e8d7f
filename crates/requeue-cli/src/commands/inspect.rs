//! Read-only commands.

use anyhow::{Result, anyhow};
use requeue_scheduler::{dependents_of, order_for_processing};
use std::path::Path;

use super::{load_fixture, select_pipeline};

pub fn order(path: &Path, pipeline: Option<&str>) -> Result<()> {
    let fixture = load_fixture(path)?;
    let pipeline = select_pipeline(&fixture, pipeline)?;

    let ordered = order_for_processing(pipeline.jobs.iter().collect(), pipeline)?;
    for (position, job) in ordered.iter().enumerate() {
        println!(
            "{:>3}  stage {:<2} {:<24} {}",
            position + 1,
            job.stage_index,
            job.name,
            job.status
        );
    }
    Ok(())
}

pub fn dependents(path: &Path, pipeline: Option<&str>, job: &str, legacy: bool) -> Result<()> {
    let fixture = load_fixture(path)?;
    let pipeline = select_pipeline(&fixture, pipeline)?;
    let job = pipeline
        .job_named(job)
        .ok_or_else(|| anyhow!("no job named '{}' in pipeline '{}'", job, pipeline.name))?;

    let found = dependents_of(job, pipeline, !legacy);
    if found.is_empty() {
        println!("No skipped dependents");
        return Ok(());
    }
    for dependent in found {
        println!("{:<24} stage {}", dependent.name, dependent.stage_index);
    }
    Ok(())
}
