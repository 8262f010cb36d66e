//! Store route handlers: listing, detail, add and edit.

use std::collections::BTreeSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use store_directory_core::query::ListingQuery;
use store_directory_core::{
    HeartOp, Page, STORES_PER_PAGE, StoreId, assert_owner, paginate,
    pagination::parse_page_param, toggle_favorite,
};

use crate::db::{RepositoryError, StoreRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::forms::{AVAILABLE_TAGS, PhotoUpload, StoreForm};
use crate::middleware::{
    Flash, FlashLevel, Identity, OptionalIdentity, push_flash, queue_flash, take_flashes,
};
use crate::models::Store;
use crate::state::AppState;
use crate::uploads::ImageIngestor;

/// A store plus the acting user's heart state, for listing cards.
#[derive(Clone)]
pub struct StoreCard {
    pub store: Store,
    /// Whether the heart button is currently on.
    pub hearted: bool,
}

impl StoreCard {
    /// Build a card, deciding the heart state from the user's hearts.
    #[must_use]
    pub fn new(store: Store, hearts: &BTreeSet<StoreId>) -> Self {
        let hearted = toggle_favorite(hearts, store.id) == HeartOp::Remove;
        Self { store, hearted }
    }

    /// Build cards for every store.
    #[must_use]
    pub fn all(stores: Vec<Store>, hearts: &BTreeSet<StoreId>) -> Vec<Self> {
        stores.into_iter().map(|s| Self::new(s, hearts)).collect()
    }
}

/// Redirect for a listing page past the end, with the flash that explains it.
#[derive(Debug, PartialEq, Eq)]
pub struct PageRedirect {
    pub location: String,
    pub message: String,
}

impl PageRedirect {
    /// `None` when the page can be rendered as is.
    #[must_use]
    pub fn for_page(page: &Page, items_on_page: usize) -> Option<Self> {
        if !page.is_out_of_range(items_on_page) {
            return None;
        }
        let last = page.last_page();
        Some(Self {
            location: format!("/stores/page/{last}"),
            message: format!(
                "Hey! You asked for page {}. But that doesn't exist. So I put you on page {last}",
                page.effective_page
            ),
        })
    }
}

/// Values pre-filled into the edit form.
#[derive(Clone, Default)]
pub struct StoreFormView {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub lng: String,
    pub lat: String,
    pub photo: Option<String>,
}

impl StoreFormView {
    /// Whether a tag's checkbox should be checked.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl From<&Store> for StoreFormView {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            description: store.description.clone(),
            tags: store.tags.clone(),
            address: store.address.clone(),
            lng: store.location.lng().to_string(),
            lat: store.location.lat().to_string(),
            photo: store.photo.clone(),
        }
    }
}

/// Store listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/index.html")]
pub struct StoresIndexTemplate {
    pub title: String,
    pub flashes: Vec<Flash>,
    pub stores: Vec<StoreCard>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Store detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/show.html")]
pub struct StoreShowTemplate {
    pub title: String,
    pub flashes: Vec<Flash>,
    pub card: StoreCard,
}

/// Add/edit store form template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/edit.html")]
pub struct StoreEditTemplate {
    pub title: String,
    pub flashes: Vec<Flash>,
    /// Where the form posts to.
    pub action: String,
    pub form: StoreFormView,
    pub available_tags: &'static [&'static str],
}

/// Display the first page of stores.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    identity: OptionalIdentity,
) -> Result<Response> {
    listing(&state, &session, &identity, None).await
}

/// Display a numbered page of stores.
///
/// A page number that isn't an integer is treated as page 1.
pub async fn page(
    State(state): State<AppState>,
    Path(page): Path<String>,
    session: Session,
    identity: OptionalIdentity,
) -> Result<Response> {
    listing(&state, &session, &identity, parse_page_param(Some(&page))).await
}

#[instrument(skip(state, session, identity))]
async fn listing(
    state: &AppState,
    session: &Session,
    identity: &OptionalIdentity,
    requested_page: Option<i64>,
) -> Result<Response> {
    let repo = StoreRepository::new(state.pool());
    let query = ListingQuery::for_page(requested_page, STORES_PER_PAGE);

    let (stores, total) = tokio::try_join!(repo.list(query), repo.count())?;
    let page = paginate(requested_page, STORES_PER_PAGE, total);

    if let Some(redirect) = PageRedirect::for_page(&page, stores.len()) {
        push_flash(session, FlashLevel::Info, redirect.message).await?;
        return Ok(Redirect::to(&redirect.location).into_response());
    }

    Ok(StoresIndexTemplate {
        title: "Stores".to_string(),
        flashes: take_flashes(session).await?,
        stores: StoreCard::all(stores, &identity.hearts()),
        current_page: page.effective_page,
        total_pages: page.total_pages,
        total_count: page.total_count,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
    }
    .into_response())
}

/// Display a single store by slug.
#[instrument(skip(state, session, identity), fields(slug = %slug))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    identity: OptionalIdentity,
) -> Result<impl IntoResponse> {
    let store = StoreRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {slug}")))?;

    Ok(StoreShowTemplate {
        title: store.name.clone(),
        flashes: take_flashes(&session).await?,
        card: StoreCard::new(store, &identity.hearts()),
    })
}

/// Display the empty add-store form.
pub async fn add_store(_identity: Identity, session: Session) -> Result<impl IntoResponse> {
    Ok(StoreEditTemplate {
        title: "Add Store".to_string(),
        flashes: take_flashes(&session).await?,
        action: "/add".to_string(),
        form: StoreFormView::default(),
        available_tags: &AVAILABLE_TAGS,
    })
}

/// Display the edit form for a store the user owns.
#[instrument(skip(state, session, identity), fields(store_id = %id, user_id = %identity.user.id))]
pub async fn edit_store(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    session: Session,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let store = find_store(&state, id).await?;
    assert_owner(store.author, identity.user.id)?;

    Ok(StoreEditTemplate {
        title: format!("Edit {}", store.name),
        flashes: take_flashes(&session).await?,
        action: format!("/add/{}", store.id),
        form: StoreFormView::from(&store),
        available_tags: &AVAILABLE_TAGS,
    })
}

/// Create a store from the multipart form.
#[instrument(skip_all, fields(user_id = %identity.user.id))]
pub async fn create_store(
    State(state): State<AppState>,
    session: Session,
    identity: Identity,
    multipart: Multipart,
) -> Result<Redirect> {
    let mut form = StoreForm::from_multipart(multipart).await?;
    let photo = ingest_photo(state.uploads(), form.photo.take()).await?;

    let created = StoreRepository::new(state.pool())
        .create(&form.into_new_store(identity.user.id, photo.clone()))
        .await;
    let store = keep_photo_if_saved(state.uploads(), photo.as_deref(), created).await?;

    tracing::info!(store_id = %store.id, slug = %store.slug, "Store created");
    add_breadcrumb("store", "Created store", Some(&[("slug", store.slug.as_str())]));
    push_flash(
        &session,
        FlashLevel::Success,
        format!("Successfully Created {}. Care to leave a review?", store.name),
    )
    .await?;

    Ok(Redirect::to(&format!("/store/{}", store.slug)))
}

/// Update a store the user owns from the multipart form.
///
/// Ownership is checked before the body is read.
#[instrument(skip(state, session, identity, multipart), fields(store_id = %id, user_id = %identity.user.id))]
pub async fn update_store(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    session: Session,
    identity: Identity,
    multipart: Multipart,
) -> Result<Redirect> {
    let existing = find_store(&state, id).await?;
    assert_owner(existing.author, identity.user.id)?;

    let mut form = StoreForm::from_multipart(multipart).await?;
    let photo = ingest_photo(state.uploads(), form.photo.take()).await?;

    let updated = StoreRepository::new(state.pool())
        .update(id, &form.into_changes(photo.clone()))
        .await;
    let store = keep_photo_if_saved(state.uploads(), photo.as_deref(), updated).await?;

    tracing::info!(slug = %store.slug, "Store updated");
    queue_flash(&session, updated_flash(&store)).await?;

    Ok(Redirect::to(&format!("/stores/{}/edit", store.id)))
}

/// Flash shown after an update, linking to the store's page.
fn updated_flash(store: &Store) -> Flash {
    Flash::new(
        FlashLevel::Success,
        format!("Successfully updated {}.", store.name),
    )
    .with_link(format!("/store/{}", store.slug), "View Store →")
}

/// Pass a save result through, discarding the freshly stored photo if the
/// save failed.
async fn keep_photo_if_saved<T>(
    uploads: &ImageIngestor,
    photo: Option<&str>,
    saved: std::result::Result<T, RepositoryError>,
) -> Result<T> {
    match saved {
        Ok(value) => Ok(value),
        Err(e) => {
            if let Some(filename) = photo {
                uploads.discard(filename).await;
            }
            Err(e.into())
        }
    }
}

async fn find_store(state: &AppState, id: StoreId) -> Result<Store> {
    StoreRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))
}

/// Ingest the uploaded photo, if one was chosen.
async fn ingest_photo(
    uploads: &ImageIngestor,
    photo: Option<PhotoUpload>,
) -> Result<Option<String>> {
    let Some(photo) = photo else {
        return Ok(None);
    };
    let filename = uploads.ingest(photo.bytes, &photo.content_type).await?;
    Ok(Some(filename))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use store_directory_core::{GeoPoint, Slug, UserId};

    use super::*;

    fn store(id: i32) -> Store {
        Store {
            id: StoreId::new(id),
            name: "Corner Coffee".to_string(),
            slug: Slug::from_name("Corner Coffee"),
            description: "Beans".to_string(),
            tags: vec!["Wifi".to_string()],
            location: GeoPoint::new(-79.38, 43.65).unwrap(),
            address: "1 Main St".to_string(),
            photo: None,
            author: UserId::new(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_card_heart_state() {
        let hearts: BTreeSet<StoreId> = [StoreId::new(1)].into_iter().collect();
        assert!(StoreCard::new(store(1), &hearts).hearted);
        assert!(!StoreCard::new(store(2), &hearts).hearted);
        assert!(!StoreCard::new(store(1), &BTreeSet::new()).hearted);
    }

    #[test]
    fn test_form_view_from_store() {
        let view = StoreFormView::from(&store(1));
        assert_eq!(view.lng, "-79.38");
        assert_eq!(view.lat, "43.65");
        assert!(view.has_tag("Wifi"));
        assert!(!view.has_tag("Licensed"));
    }

    #[test]
    fn test_page_past_end_redirects_with_message() {
        let page = paginate(Some(3), STORES_PER_PAGE, 4);
        let redirect = PageRedirect::for_page(&page, 0).unwrap();
        assert_eq!(redirect.location, "/stores/page/1");
        assert_eq!(
            redirect.message,
            "Hey! You asked for page 3. But that doesn't exist. So I put you on page 1"
        );
    }

    #[test]
    fn test_page_in_range_renders() {
        let page = paginate(Some(2), STORES_PER_PAGE, 6);
        assert!(PageRedirect::for_page(&page, 2).is_none());

        let empty = paginate(Some(1), STORES_PER_PAGE, 0);
        assert!(PageRedirect::for_page(&empty, 0).is_none());
    }

    #[test]
    fn test_updated_flash_links_to_store() {
        let flash = updated_flash(&store(1));
        assert_eq!(flash.level, FlashLevel::Success);
        assert_eq!(flash.message, "Successfully updated Corner Coffee.");
        assert_eq!(flash.link.unwrap().href, "/store/corner-coffee");
    }

    #[tokio::test]
    async fn test_failed_save_discards_photo() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = ImageIngestor::new(dir.path());
        std::fs::write(dir.path().join("t-orphan.png"), b"png").unwrap();

        let saved: std::result::Result<(), RepositoryError> =
            Err(RepositoryError::Conflict("slug".to_string()));
        let err = keep_photo_if_saved(&uploads, Some("t-orphan.png"), saved)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(RepositoryError::Conflict(_))));
        assert!(!dir.path().join("t-orphan.png").exists());
    }

    #[tokio::test]
    async fn test_successful_save_keeps_photo() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = ImageIngestor::new(dir.path());
        std::fs::write(dir.path().join("t-kept.png"), b"png").unwrap();

        let saved: std::result::Result<u8, RepositoryError> = Ok(7);
        let value = keep_photo_if_saved(&uploads, Some("t-kept.png"), saved).await.unwrap();

        assert_eq!(value, 7);
        assert!(dir.path().join("t-kept.png").exists());
    }

    #[tokio::test]
    async fn test_ingest_photo_skips_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = ImageIngestor::new(dir.path());
        assert!(ingest_photo(&uploads, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ingest_photo_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = ImageIngestor::new(dir.path());
        let photo = PhotoUpload {
            content_type: "text/plain".to_string(),
            bytes: bytes::Bytes::from_static(b"hi"),
        };
        let err = ingest_photo(&uploads, Some(photo)).await.unwrap_err();
        assert!(matches!(err, AppError::Ingest(_)));
    }
}
