//! Directory user management commands.
//!
//! Login happens upstream; this only creates the rows that sessions point at.
//!
//! # Usage
//!
//! ```bash
//! sd-cli user create -e wes@example.com -n "Wes"
//! ```

use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Blank name.
    #[error("Name must not be blank")]
    BlankName,

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),
}

/// Check the inputs before touching the database.
fn validate(email: &str, name: &str) -> Result<(), UserError> {
    // Basic email validation
    if !email.contains('@') || !email.contains('.') {
        return Err(UserError::InvalidEmail(email.to_owned()));
    }
    if name.trim().is_empty() {
        return Err(UserError::BlankName);
    }
    Ok(())
}

/// Create a new directory user and return their ID.
pub async fn create_user(email: &str, name: &str) -> Result<i32, UserError> {
    validate(email, name)?;

    let pool = connect().await?;
    tracing::info!("Creating user: {}", email);

    let existing: Option<i32> =
        sqlx::query_scalar("SELECT id FROM directory.app_user WHERE email = $1")
            .bind(email)
            .fetch_optional(&pool)
            .await?;

    if existing.is_some() {
        return Err(UserError::UserExists(email.to_owned()));
    }

    let user_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO directory.app_user (email, name)
        VALUES ($1, $2)
        RETURNING id
        ",
    )
    .bind(email)
    .bind(name.trim())
    .fetch_one(&pool)
    .await?;

    tracing::info!("User created successfully! ID: {}, Email: {}", user_id, email);
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_email() {
        assert!(matches!(
            validate("not-an-email", "Wes"),
            Err(UserError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        assert!(matches!(
            validate("wes@example.com", "  "),
            Err(UserError::BlankName)
        ));
    }

    #[test]
    fn test_validate_accepts_good_input() {
        assert!(validate("wes@example.com", "Wes").is_ok());
    }
}
