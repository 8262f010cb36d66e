//! Hearted stores page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use store_directory_core::StoreId;

use crate::db::StoreRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Flash, Identity, take_flashes};
use crate::routes::stores::StoreCard;
use crate::state::AppState;

/// Hearted stores page template.
#[derive(Template, WebTemplate)]
#[template(path = "hearts.html")]
pub struct HeartsTemplate {
    pub title: String,
    pub flashes: Vec<Flash>,
    pub stores: Vec<StoreCard>,
}

/// Display the stores the user has hearted.
#[instrument(skip_all, fields(user_id = %identity.user.id))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let ids: Vec<StoreId> = identity.hearts.iter().copied().collect();
    let stores = StoreRepository::new(state.pool()).by_ids(&ids).await?;

    Ok(HeartsTemplate {
        title: "Hearted Stores".to_string(),
        flashes: take_flashes(&session).await?,
        stores: StoreCard::all(stores, &identity.hearts),
    })
}
