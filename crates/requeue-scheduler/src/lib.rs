//! Dependent-job resolution and requeue orchestration.
//!
//! When a job is retried, the jobs that were skipped because of it have to
//! be reconsidered. This crate finds those jobs, orders them by stage and
//! `needs`, and processes them one at a time under optimistic locking.

pub mod hierarchy;
pub mod orchestrator;
pub mod ordering;
pub mod resolver;
pub mod retry;

pub use hierarchy::descendants;
pub use orchestrator::{
    BridgeOutcome, FailureReason, JobFailure, JobOutcome, ProcessedJob, RequeueError,
    RequeueOrchestrator, RequeueReport,
};
pub use ordering::order_for_processing;
pub use resolver::dependents_of;
pub use retry::{LockOutcome, retry_lock};
