//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! sd-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DIRECTORY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Directory migrations live in `crates/web/migrations/`. The session table
//! is created by `tower-sessions-sqlx-store` in the `tower_sessions` schema.

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session store migration error: {0}")]
    SessionStore(#[from] sqlx::Error),
}

/// Run directory migrations, then create the session store table.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running directory migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Running session store migrations...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
