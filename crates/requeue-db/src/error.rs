//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid row: {0}")]
    InvalidRow(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<DbError> for requeue_core::Error {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => requeue_core::Error::NotFound(msg),
            DbError::InvalidRow(msg) => requeue_core::Error::InvalidInput(msg),
            other => requeue_core::Error::Storage(other.to_string()),
        }
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
