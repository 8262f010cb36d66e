//! HTTP route handlers for the directory.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - First page of stores
//! GET  /stores                    - First page of stores
//! GET  /stores/page/{page}        - Numbered page of stores
//! GET  /store/{slug}              - Store detail
//!
//! # Editing (requires identity)
//! GET  /add                       - Add-store form
//! POST /add                       - Create store (multipart)
//! GET  /stores/{id}/edit          - Edit form (owner only)
//! POST /add/{id}                  - Update store (multipart, owner only)
//!
//! # Browsing
//! GET  /tags                      - Every tagged store
//! GET  /tags/{tag}                - Stores with a tag
//! GET  /map                       - Map page
//! GET  /hearts                    - Hearted stores (requires identity)
//!
//! # JSON API
//! GET  /api/search?q=             - Text search, at most 5 stores
//! GET  /api/stores/near?lng=&lat= - Stores within 10 km, at most 10
//! POST /api/stores/{id}/heart     - Toggle a heart (requires identity)
//! ```

pub mod api;
pub mod hearts;
pub mod map;
pub mod stores;
pub mod tags;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the JSON API routes router.
///
/// Paths are absolute so the identity extractor sees the `/api/` prefix.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(api::search))
        .route("/api/stores/near", get(api::near))
        .route("/api/stores/{id}/heart", post(api::heart))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route("/stores/page/{page}", get(stores::page))
        .route("/stores/{id}/edit", get(stores::edit_store))
        .route("/store/{slug}", get(stores::show))
        .route("/add", get(stores::add_store).post(stores::create_store))
        .route("/add/{id}", post(stores::update_store))
}

/// Create all routes for the directory.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(store_routes())
        .route("/tags", get(tags::index))
        .route("/tags/{tag}", get(tags::show))
        .route("/map", get(map::page))
        .route("/hearts", get(hearts::index))
        .merge(api_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;
    use crate::config::test_config;

    /// Router backed by a pool that never connects. Only requests rejected
    /// before touching the database can be exercised.
    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/store_directory_test")
            .unwrap();
        let state = AppState::new(test_config(std::env::temp_dir()), pool);

        routes()
            .layer(SessionManagerLayer::new(MemoryStore::default()))
            .with_state(state)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_near_rejects_bad_coordinates() {
        let response = app()
            .oneshot(get_request("/api/stores/near?lng=abc&lat=43.6"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_near_rejects_out_of_range_latitude() {
        let response = app()
            .oneshot(get_request("/api/stores/near?lng=10&lat=91"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_near_rejects_missing_coordinates() {
        let response = app()
            .oneshot(get_request("/api/stores/near"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_map_page_renders() {
        let response = app().oneshot(get_request("/map")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("/api/stores/near"));
    }

    #[tokio::test]
    async fn test_heart_requires_identity() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/stores/1/heart")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_add_form_redirects_anonymous_to_login() {
        let response = app().oneshot(get_request("/add")).await.unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_hearts_page_redirects_anonymous_to_login() {
        let response = app().oneshot(get_request("/hearts")).await.unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }
}
