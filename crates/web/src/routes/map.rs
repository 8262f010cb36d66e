//! Map page handler.
//!
//! The page itself is static; markers are loaded from `/api/stores/near`.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tower_sessions::Session;

use crate::error::Result;
use crate::filters;
use crate::middleware::{Flash, take_flashes};

/// Map page template.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub title: String,
    pub flashes: Vec<Flash>,
}

/// Display the map page.
pub async fn page(session: Session) -> Result<impl IntoResponse> {
    Ok(MapTemplate {
        title: "Map".to_string(),
        flashes: take_flashes(&session).await?,
    })
}
