//! User domain types.

use chrono::{DateTime, Utc};

use store_directory_core::UserId;

/// A directory user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
