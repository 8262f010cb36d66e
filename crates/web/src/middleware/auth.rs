//! Identity extractors.
//!
//! Handlers that act on behalf of a user take an [`Identity`] argument. The
//! session only carries the user's ID (written by the upstream login flow);
//! the user row and their hearts are loaded from the database per request.

use std::collections::BTreeSet;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use store_directory_core::StoreId;

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// Where pages send anonymous visitors.
pub const LOGIN_PATH: &str = "/login";

/// The acting user, loaded for this request.
///
/// If nobody is logged in, pages redirect to [`LOGIN_PATH`] and `/api/*`
/// requests get 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(identity: Identity) -> impl IntoResponse {
///     format!("{} has {} hearts", identity.user.name, identity.hearts.len())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    pub hearts: BTreeSet<StoreId>,
}

/// Error returned when an identity is required but cannot be resolved.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Loading the user failed.
    Failed(AppError),
}

impl AuthRejection {
    fn anonymous(parts: &Parts) -> Self {
        if parts.uri.path().starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

/// Resolve the session's user, if any.
///
/// A session pointing at a user that no longer exists counts as anonymous.
async fn load_identity(parts: &Parts, state: &AppState) -> Result<Option<Identity>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    let Some(current) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await?
    else {
        return Ok(None);
    };

    let users = UserRepository::new(state.pool());
    let Some(user) = users.get_by_id(current.id).await? else {
        tracing::warn!(user_id = %current.id, "Session refers to a missing user");
        return Ok(None);
    };
    let hearts = users.hearts(user.id).await?;

    set_sentry_user(&user.id, Some(&user.email));
    Ok(Some(Identity { user, hearts }))
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        load_identity(parts, state)
            .await
            .map_err(AuthRejection::Failed)?
            .ok_or_else(|| AuthRejection::anonymous(parts))
    }
}

/// Extractor that optionally resolves the acting user.
///
/// Unlike [`Identity`], this does not reject anonymous requests.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    /// Hearts of the acting user, empty when anonymous.
    #[must_use]
    pub fn hearts(&self) -> BTreeSet<StoreId> {
        self.0
            .as_ref()
            .map(|identity| identity.hearts.clone())
            .unwrap_or_default()
    }
}

impl FromRequestParts<AppState> for OptionalIdentity {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        load_identity(parts, state)
            .await
            .map(Self)
            .map_err(AuthRejection::Failed)
    }
}
