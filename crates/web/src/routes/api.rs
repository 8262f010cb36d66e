//! JSON API handlers used by the search box, the map and the heart buttons.

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use store_directory_core::query::{NearQuery, TextSearch};
use store_directory_core::{GeoPoint, HeartOp, Slug, StoreId, UserId};

use crate::db::{StoreRepository, UserRepository};
use crate::error::Result;
use crate::middleware::Identity;
use crate::models::{NearbyStore, SearchHit};
use crate::state::AppState;

/// Query parameters for `/api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Query parameters for `/api/stores/near`.
///
/// Kept as text so that parse failures surface as coordinate errors.
#[derive(Debug, Deserialize)]
pub struct NearParams {
    #[serde(default)]
    pub lng: String,
    #[serde(default)]
    pub lat: String,
}

/// A text search result.
#[derive(Debug, Serialize)]
pub struct StoreJson {
    pub id: StoreId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub tags: Vec<String>,
    pub location: GeoPoint,
    pub address: String,
    pub photo: Option<String>,
    pub score: f32,
}

impl From<SearchHit> for StoreJson {
    fn from(hit: SearchHit) -> Self {
        let store = hit.store;
        Self {
            id: store.id,
            name: store.name,
            slug: store.slug,
            description: store.description,
            tags: store.tags,
            location: store.location,
            address: store.address,
            photo: store.photo,
            score: hit.score,
        }
    }
}

/// A map marker.
#[derive(Debug, Serialize)]
pub struct NearStoreJson {
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub location: GeoPoint,
    pub photo: Option<String>,
}

impl From<NearbyStore> for NearStoreJson {
    fn from(store: NearbyStore) -> Self {
        Self {
            slug: store.slug,
            name: store.name,
            description: store.description,
            location: store.location,
            photo: store.photo,
        }
    }
}

/// The user's hearts after a toggle.
#[derive(Debug, Serialize)]
pub struct HeartJson {
    pub id: UserId,
    pub hearts: Vec<StoreId>,
    /// What the toggle did.
    pub op: HeartOp,
}

impl HeartJson {
    /// Build the response from the hearts as stored after the toggle.
    #[must_use]
    pub fn new(id: UserId, stored: BTreeSet<StoreId>, op: HeartOp) -> Self {
        Self {
            id,
            hearts: stored.into_iter().collect(),
            op,
        }
    }
}

/// Full-text search over store names and descriptions, best matches first.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<StoreJson>>> {
    let hits = StoreRepository::new(state.pool())
        .search(&TextSearch::new(params.q))
        .await?;

    Ok(Json(hits.into_iter().map(StoreJson::from).collect()))
}

/// Stores near a point, nearest first.
///
/// Coordinates are validated before any query is issued.
#[instrument(skip(state))]
pub async fn near(
    State(state): State<AppState>,
    Query(params): Query<NearParams>,
) -> Result<Json<Vec<NearStoreJson>>> {
    let query = NearQuery::parse(&params.lng, &params.lat)?;
    let stores = StoreRepository::new(state.pool()).near(&query).await?;

    Ok(Json(stores.into_iter().map(NearStoreJson::from).collect()))
}

/// Toggle a heart on a store for the acting user.
#[instrument(skip(state, identity), fields(store_id = %id, user_id = %identity.user.id))]
pub async fn heart(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    identity: Identity,
) -> Result<Json<HeartJson>> {
    let users = UserRepository::new(state.pool());
    let op = users.toggle_heart(identity.user.id, id).await?;
    let stored = users.hearts(identity.user.id).await?;
    tracing::info!(op = op.as_str(), hearts = stored.len(), "Heart toggled");

    Ok(Json(HeartJson::new(identity.user.id, stored, op)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_json_shape() {
        let stored = BTreeSet::from([StoreId::new(5), StoreId::new(1)]);
        let json = serde_json::to_value(HeartJson::new(UserId::new(3), stored, HeartOp::Add))
            .unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "hearts": [1, 5], "op": "add"}));
    }

    #[test]
    fn test_heart_json_reports_stored_hearts() {
        // Store 9 was hearted from another tab after this request's identity was loaded.
        let stored = BTreeSet::from([StoreId::new(2), StoreId::new(9)]);
        let body = HeartJson::new(UserId::new(3), stored, HeartOp::Add);
        assert_eq!(body.hearts, vec![StoreId::new(2), StoreId::new(9)]);
    }

    #[test]
    fn test_near_store_json_from_nearby() {
        let json = serde_json::to_value(NearStoreJson::from(NearbyStore {
            slug: Slug::from_name("Corner Coffee"),
            name: "Corner Coffee".to_string(),
            description: "Beans".to_string(),
            location: GeoPoint::new(-79.5, 43.5).unwrap(),
            photo: None,
        }))
        .unwrap();
        assert_eq!(json["slug"], "corner-coffee");
        assert_eq!(json["location"]["lng"], -79.5);
        assert!(json["photo"].is_null());
    }
}
