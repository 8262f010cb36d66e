//! Tag page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use store_directory_core::query::TagFilter;

use crate::db::StoreRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Flash, OptionalIdentity, take_flashes};
use crate::models::TagCount;
use crate::routes::stores::StoreCard;
use crate::state::AppState;

/// Tag page template.
#[derive(Template, WebTemplate)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub title: String,
    pub flashes: Vec<Flash>,
    pub tags: Vec<TagCount>,
    /// The selected tag, if any.
    pub active: Option<String>,
    pub stores: Vec<StoreCard>,
}

impl TagsTemplate {
    /// Whether `tag` is the selected one.
    #[must_use]
    pub fn is_active(&self, tag: &str) -> bool {
        self.active.as_deref() == Some(tag)
    }
}

/// Every tag, with every tagged store.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    identity: OptionalIdentity,
) -> Result<impl IntoResponse> {
    render(&state, &session, &identity, TagFilter::Any).await
}

/// Every tag, with the stores carrying `tag`.
pub async fn show(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    session: Session,
    identity: OptionalIdentity,
) -> Result<impl IntoResponse> {
    render(&state, &session, &identity, TagFilter::from_param(Some(&tag))).await
}

#[instrument(skip(state, session, identity))]
async fn render(
    state: &AppState,
    session: &Session,
    identity: &OptionalIdentity,
    filter: TagFilter,
) -> Result<TagsTemplate> {
    let repo = StoreRepository::new(state.pool());
    let (tags, stores) = tokio::try_join!(repo.tag_counts(), repo.by_tag(&filter))?;
    let active = filter.tag().map(str::to_owned);

    Ok(TagsTemplate {
        title: active.clone().unwrap_or_else(|| "Tags".to_string()),
        flashes: take_flashes(session).await?,
        tags,
        active,
        stores: StoreCard::all(stores, &identity.hearts()),
    })
}
