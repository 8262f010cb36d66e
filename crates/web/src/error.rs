//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use store_directory_core::{CoordinateError, OwnershipError};

use crate::db::RepositoryError;
use crate::forms::FormError;
use crate::uploads::IngestError;

/// Application-level error type for the directory.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// The acting user does not own the store.
    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    /// Photo ingestion failed.
    #[error("Upload error: {0}")]
    Ingest(#[from] IngestError),

    /// The store form was invalid.
    #[error("Form error: {0}")]
    Form(#[from] FormError),

    /// Query-string coordinates were invalid.
    #[error("Invalid coordinates: {0}")]
    Coordinates(#[from] CoordinateError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Ownership(_) => StatusCode::FORBIDDEN,
            Self::Ingest(err) => match err {
                IngestError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                IngestError::Decode(_) => StatusCode::BAD_REQUEST,
                IngestError::Encode(_) | IngestError::Io(_) | IngestError::Task(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Form(err) => match err {
                FormError::Multipart(e) => e.status(),
                FormError::MissingField(_) | FormError::Coordinates(_) => StatusCode::BAD_REQUEST,
            },
            Self::Coordinates(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            _ if status.is_server_error() => "Internal server error".to_string(),
            Self::Ownership(err) => err.to_string(),
            Self::Ingest(err) => err.to_string(),
            Self::Form(err) => err.to_string(),
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called once the request's identity is resolved to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("store", "Updated store", Some(&[("store_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use store_directory_core::{GeoPoint, UserId, assert_owner};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_text(err: AppError) -> String {
        let body = err.into_response().into_body();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("store".to_string());
        assert_eq!(err.to_string(), "Not found: store");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("slug".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_error_status_codes() {
        let ownership = assert_owner(UserId::new(1), UserId::new(2)).unwrap_err();
        assert_eq!(get_status(ownership.into()), StatusCode::FORBIDDEN);

        let coords = GeoPoint::parse("abc", "1").unwrap_err();
        assert_eq!(get_status(coords.into()), StatusCode::BAD_REQUEST);

        let media = IngestError::UnsupportedMediaType("text/plain".into());
        assert_eq!(get_status(media.into()), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let missing = FormError::MissingField("name");
        assert_eq!(get_status(missing.into()), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_client_messages() {
        let ownership = assert_owner(UserId::new(1), UserId::new(2)).unwrap_err();
        assert_eq!(
            body_text(ownership.into()).await,
            "You must own a store in order to edit it!"
        );

        let media = IngestError::UnsupportedMediaType("text/plain".into());
        assert_eq!(body_text(media.into()).await, "That filetype isn't allowed!");
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad point".into()));
        assert_eq!(body_text(err).await, "Internal server error");
    }
}
