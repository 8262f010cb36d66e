//! Store domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_directory_core::{GeoPoint, Slug, StoreId, UserId};

/// A store listing (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// URL-safe unique identifier derived from the name.
    pub slug: Slug,
    /// Free-form description.
    pub description: String,
    /// Tags, in the order they were saved.
    pub tags: Vec<String>,
    /// Map position.
    pub location: GeoPoint,
    /// Street address shown alongside the map.
    pub address: String,
    /// Filename of the resized photo under the upload directory.
    pub photo: Option<String>,
    /// User who created the store. Never changes.
    pub author: UserId,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
}

/// Values for inserting a store.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub location: GeoPoint,
    pub address: String,
    pub photo: Option<String>,
    pub author: UserId,
}

/// Values for updating a store. The author is not updatable.
#[derive(Debug, Clone)]
pub struct StoreChanges {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub location: GeoPoint,
    pub address: String,
    /// `None` keeps the existing photo.
    pub photo: Option<String>,
}

/// A text search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub store: Store,
    /// Relevance score from the text index.
    pub score: f32,
}

/// The subset of a store needed to draw a map marker.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyStore {
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub location: GeoPoint,
    pub photo: Option<String>,
}

/// A tag and the number of stores carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}
