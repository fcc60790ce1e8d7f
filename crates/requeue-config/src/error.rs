//! Configuration parsing errors.

use requeue_core::DagError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    Parse(#[from] kdl::KdlError),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("duplicate definition: {0}")]
    Duplicate(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("cycle detected in dependencies: {0}")]
    CycleDetected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DagError> for ConfigError {
    fn from(err: DagError) -> Self {
        match err {
            DagError::Cycle { path } => ConfigError::CycleDetected(path.join(" -> ")),
            DagError::MissingNode { node, dependency } => ConfigError::InvalidReference(format!(
                "job '{}' needs unknown job '{}'",
                node, dependency
            )),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
