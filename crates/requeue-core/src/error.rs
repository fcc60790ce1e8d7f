//! Error types for the requeue scheduler.

use thiserror::Error;

use crate::ResourceId;
use crate::job::JobStatus;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("stale version for job {job}: expected {expected}, found {actual}")]
    StaleVersion {
        job: ResourceId,
        expected: u64,
        actual: u64,
    },

    #[error("job {job} is {status}, expected {expected}")]
    UnexpectedState {
        job: ResourceId,
        status: JobStatus,
        expected: JobStatus,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether a retry with fresh state may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::StaleVersion { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
