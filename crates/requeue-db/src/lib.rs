//! Job store implementations for the requeue scheduler.
//!
//! Provides an in-memory store and a PostgreSQL store, both implementing
//! the core `JobStore` and `BridgeResetter` traits with optimistic locking.

pub mod error;
pub mod memory;
pub mod pg;

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use pg::PgJobStore;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a new database connection pool.
pub async fn create_pool(database_url: &str) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
