//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::DirectoryConfig;
use crate::uploads::ImageIngestor;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DirectoryConfig,
    pool: PgPool,
    uploads: ImageIngestor,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Directory configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: DirectoryConfig, pool: PgPool) -> Self {
        let uploads = ImageIngestor::new(config.upload_dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                uploads,
            }),
        }
    }

    /// Get a reference to the directory configuration.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the photo ingestor.
    #[must_use]
    pub fn uploads(&self) -> &ImageIngestor {
        &self.inner.uploads
    }
}
