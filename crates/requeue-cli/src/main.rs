//! Requeue CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "requeue")]
#[command(about = "Inspect and retry jobs in pipeline fixtures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a pipeline fixture
    Validate {
        /// Path to the fixture file
        #[arg(default_value = "pipeline.kdl")]
        path: PathBuf,
    },
    /// Print the processing order of a pipeline's jobs
    Order {
        path: PathBuf,
        /// Pipeline name, defaults to the first pipeline in the file
        #[arg(long)]
        pipeline: Option<String>,
    },
    /// List the skipped jobs that depend on a job
    Dependents {
        path: PathBuf,
        #[arg(long)]
        pipeline: Option<String>,
        /// Job name
        #[arg(long)]
        job: String,
        /// Only use stage-based resolution
        #[arg(long)]
        legacy: bool,
    },
    /// Retry a job and requeue its skipped dependents
    Retry {
        path: PathBuf,
        #[arg(long)]
        pipeline: Option<String>,
        #[arg(long)]
        job: String,
        #[arg(long)]
        legacy: bool,
        /// Settings file with a `requeue` block
        #[arg(long, env = "REQUEUE_SETTINGS")]
        settings: Option<PathBuf>,
        /// Run against Postgres instead of an in-memory store
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
        Commands::Order { path, pipeline } => {
            commands::inspect::order(&path, pipeline.as_deref())?;
        }
        Commands::Dependents {
            path,
            pipeline,
            job,
            legacy,
        } => {
            commands::inspect::dependents(&path, pipeline.as_deref(), &job, legacy)?;
        }
        Commands::Retry {
            path,
            pipeline,
            job,
            legacy,
            settings,
            database_url,
            json,
        } => {
            let options = commands::retry::RetryOptions {
                pipeline,
                job,
                legacy,
                settings,
                database_url,
                json,
            };
            commands::retry::run(&path, options).await?;
        }
    }

    Ok(())
}
