//! User repository for database operations.
//!
//! Covers the user lookup needed to resolve a session identity and the heart
//! relation between users and stores.

use std::collections::BTreeSet;

use sqlx::PgPool;

use store_directory_core::{HeartOp, StoreId, UserId};

use super::{RepositoryError, map_constraint_error};
use crate::models::User;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, name, email, created_at
            FROM directory.app_user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// The set of stores a user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearts(&self, user_id: UserId) -> Result<BTreeSet<StoreId>, RepositoryError> {
        let rows: Vec<(StoreId,)> = sqlx::query_as(
            r"
            SELECT store_id
            FROM directory.user_heart
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Toggle a heart in a single statement and report what happened.
    ///
    /// The delete and the conditional insert run in one statement, so the
    /// decision is made against the row state at execution time rather than a
    /// snapshot read earlier by the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or store doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn toggle_heart(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<HeartOp, RepositoryError> {
        let (removed,): (bool,) = sqlx::query_as(
            r"
            WITH removed AS (
                DELETE FROM directory.user_heart
                WHERE user_id = $1 AND store_id = $2
                RETURNING store_id
            ), added AS (
                INSERT INTO directory.user_heart (user_id, store_id)
                SELECT $1, $2
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT DO NOTHING
                RETURNING store_id
            )
            SELECT EXISTS (SELECT 1 FROM removed)
            ",
        )
        .bind(user_id)
        .bind(store_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "heart already exists"))?;

        Ok(if removed { HeartOp::Remove } else { HeartOp::Add })
    }
}
