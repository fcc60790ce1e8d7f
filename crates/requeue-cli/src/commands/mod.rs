//! CLI command implementations.

pub mod inspect;
pub mod retry;

use anyhow::{Context, Result, anyhow};
use requeue_config::{Fixture, parse_fixture};
use requeue_core::Pipeline;
use std::path::Path;

pub fn validate(path: &Path) -> Result<()> {
    let fixture = load_fixture(path)?;
    for pipeline in &fixture.pipelines {
        println!(
            "{}: {} jobs, {} skipped",
            pipeline.name,
            pipeline.jobs.len(),
            pipeline.skipped_jobs().count()
        );
        if pipeline.bridge_waiting() {
            println!("  source bridge is reset on retry");
        }
    }
    println!("Configuration is valid");
    Ok(())
}

pub(crate) fn load_fixture(path: &Path) -> Result<Fixture> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_fixture(&content).with_context(|| format!("invalid fixture {}", path.display()))
}

/// Pick a pipeline by name, or the first one when no name is given.
pub(crate) fn select_pipeline<'a>(
    fixture: &'a Fixture,
    name: Option<&str>,
) -> Result<&'a Pipeline> {
    match name {
        Some(name) => fixture
            .pipeline(name)
            .ok_or_else(|| anyhow!("no pipeline named '{}'", name)),
        None => fixture
            .pipelines
            .first()
            .ok_or_else(|| anyhow!("fixture has no pipelines")),
    }
}
