//! Core domain types and traits for the pipeline requeue scheduler.
//!
//! This crate contains:
//! - Resource identifiers
//! - Job and pipeline types, including the job status state machine
//! - The dependency graph type and DAG ordering
//! - Store and bridge traits consumed by the scheduler

pub mod dag;
pub mod error;
pub mod graph;
pub mod id;
pub mod job;
pub mod pipeline;
pub mod status;
pub mod store;

pub use dag::DagError;
pub use error::{Error, Result};
pub use graph::DependencyGraph;
pub use id::ResourceId;
pub use job::{Job, JobStatus, SchedulingType};
pub use pipeline::{BridgeStrategy, Pipeline, SourceBridge};
pub use store::{BridgeReset, BridgeResetter, JobStore};
