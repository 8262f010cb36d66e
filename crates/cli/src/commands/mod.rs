//! CLI command implementations.

pub mod migrate;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by commands that need the directory database.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read `DIRECTORY_DATABASE_URL`, falling back to `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("DIRECTORY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DIRECTORY_DATABASE_URL"))
}

/// Connect to the directory database.
pub async fn connect() -> Result<PgPool, CommandError> {
    use secrecy::ExposeSecret;

    let url = database_url()?;
    tracing::info!("Connecting to directory database...");
    Ok(PgPool::connect(url.expose_secret()).await?)
}
