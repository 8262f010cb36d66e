//! Store repository for database operations.
//!
//! Queries are assembled from the parameter types in `store_directory_core::query`.
//! Ranking, distance ordering and tag aggregation all happen in `PostgreSQL`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use store_directory_core::query::{ListingQuery, NearQuery, TagFilter, TextSearch};
use store_directory_core::{GeoPoint, Slug, StoreId, UserId};

use super::{RepositoryError, map_constraint_error};
use crate::models::{NearbyStore, NewStore, SearchHit, Store, StoreChanges, TagCount};

/// Columns selected for a full [`Store`].
const STORE_COLUMNS: &str = "id, name, slug, description, tags, \
    ST_X(location::geometry) AS lng, ST_Y(location::geometry) AS lat, \
    address, photo, author_id, created_at";

/// Geography literal built from `(lng, lat)` bind parameters.
macro_rules! point_sql {
    ($lng:literal, $lat:literal) => {
        concat!("ST_SetSRID(ST_MakePoint(", $lng, ", ", $lat, "), 4326)::geography")
    };
}

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    slug: Slug,
    description: String,
    tags: Vec<String>,
    lng: f64,
    lat: f64,
    address: String,
    photo: Option<String>,
    author_id: UserId,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(r: StoreRow) -> Result<Self, Self::Error> {
        let location = GeoPoint::new(r.lng, r.lat)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid store location: {e}")))?;

        Ok(Self {
            id: r.id,
            name: r.name,
            slug: r.slug,
            description: r.description,
            tags: r.tags,
            location,
            address: r.address,
            photo: r.photo,
            author: r.author_id,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SearchRow {
    #[sqlx(flatten)]
    store: StoreRow,
    score: f32,
}

#[derive(sqlx::FromRow)]
struct NearbyRow {
    slug: Slug,
    name: String,
    description: String,
    lng: f64,
    lat: f64,
    photo: Option<String>,
}

fn into_stores(rows: Vec<StoreRow>) -> Result<Vec<Store>, RepositoryError> {
    rows.into_iter().map(Store::try_from).collect()
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Derive a slug from `name` that no other store uses.
    ///
    /// `exclude` skips the store being updated so renaming a store to its own
    /// name keeps its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unique_slug(
        &self,
        name: &str,
        exclude: Option<StoreId>,
    ) -> Result<Slug, RepositoryError> {
        let base = Slug::from_name(name);
        let pattern = format!("^{}(-[0-9]+)?$", regex_escape(base.as_str()));

        let taken: Vec<String> = sqlx::query_scalar(
            r"
            SELECT slug
            FROM directory.store
            WHERE slug ~ $1 AND ($2::INTEGER IS NULL OR id <> $2)
            ",
        )
        .bind(&pattern)
        .bind(exclude)
        .fetch_all(self.pool)
        .await?;

        Ok(base.disambiguate(taken.iter().map(String::as_str)))
    }

    /// Insert a new store with a freshly derived unique slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug was taken concurrently.
    /// Returns `RepositoryError::NotFound` if the author does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        let slug = self.unique_slug(&store.name, None).await?;

        let sql = format!(
            r"
            INSERT INTO directory.store
                (name, slug, description, tags, location, address, photo, author_id)
            VALUES ($1, $2, $3, $4, {}, $7, $8, $9)
            RETURNING {STORE_COLUMNS}
            ",
            point_sql!("$5", "$6"),
        );

        let row: StoreRow = sqlx::query_as(&sql)
            .bind(&store.name)
            .bind(&slug)
            .bind(&store.description)
            .bind(&store.tags)
            .bind(store.location.lng())
            .bind(store.location.lat())
            .bind(&store.address)
            .bind(&store.photo)
            .bind(store.author)
            .fetch_one(self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "slug already exists"))?;

        row.try_into()
    }

    /// Update a store's editable fields, re-deriving its slug from the new name.
    ///
    /// The author column is never written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug was taken concurrently.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: StoreId,
        changes: &StoreChanges,
    ) -> Result<Store, RepositoryError> {
        let slug = self.unique_slug(&changes.name, Some(id)).await?;

        let sql = format!(
            r"
            UPDATE directory.store
            SET name = $2,
                slug = $3,
                description = $4,
                tags = $5,
                location = {},
                address = $8,
                photo = COALESCE($9, photo)
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            ",
            point_sql!("$6", "$7"),
        );

        let row: Option<StoreRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(&slug)
            .bind(&changes.description)
            .bind(&changes.tags)
            .bind(changes.location.lng())
            .bind(changes.location.lat())
            .bind(&changes.address)
            .bind(&changes.photo)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "slug already exists"))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored location is invalid.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM directory.store WHERE id = $1");
        let row: Option<StoreRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Store::try_from).transpose()
    }

    /// Get a store by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored location is invalid.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM directory.store WHERE slug = $1");
        let row: Option<StoreRow> = sqlx::query_as(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(Store::try_from).transpose()
    }

    /// One page of stores, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: ListingQuery) -> Result<Vec<Store>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM directory.store
            ORDER BY created_at DESC, id DESC
            OFFSET $1
            LIMIT $2
            "
        );
        let rows: Vec<StoreRow> = sqlx::query_as(&sql)
            .bind(query.offset)
            .bind(query.limit)
            .fetch_all(self.pool)
            .await?;

        into_stores(rows)
    }

    /// Total number of stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM directory.store")
            .fetch_one(self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Stores matching a tag filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_tag(&self, filter: &TagFilter) -> Result<Vec<Store>, RepositoryError> {
        let rows: Vec<StoreRow> = match filter {
            TagFilter::Any => {
                let sql = format!(
                    r"
                    SELECT {STORE_COLUMNS}
                    FROM directory.store
                    WHERE cardinality(tags) > 0
                    ORDER BY created_at DESC
                    "
                );
                sqlx::query_as(&sql).fetch_all(self.pool).await?
            }
            TagFilter::Tag(tag) => {
                let sql = format!(
                    r"
                    SELECT {STORE_COLUMNS}
                    FROM directory.store
                    WHERE tags @> ARRAY[$1]::TEXT[]
                    ORDER BY created_at DESC
                    "
                );
                sqlx::query_as(&sql).bind(tag).fetch_all(self.pool).await?
            }
        };

        into_stores(rows)
    }

    /// Every tag in use with the number of stores carrying it, most used first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let tags = sqlx::query_as::<_, TagCount>(
            r"
            SELECT tag, COUNT(*) AS count
            FROM directory.store, unnest(tags) AS tag
            GROUP BY tag
            ORDER BY count DESC, tag ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(tags)
    }

    /// Full-text search ranked by relevance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, search: &TextSearch) -> Result<Vec<SearchHit>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {STORE_COLUMNS}, ts_rank(search, query) AS score
            FROM directory.store, websearch_to_tsquery('english', $1) AS query
            WHERE search @@ query
            ORDER BY score DESC
            LIMIT $2
            "
        );
        let rows: Vec<SearchRow> = sqlx::query_as(&sql)
            .bind(&search.terms)
            .bind(search.limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter()
            .map(|r| {
                Ok(SearchHit {
                    store: r.store.try_into()?,
                    score: r.score,
                })
            })
            .collect()
    }

    /// Stores within the query radius, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored location is invalid.
    pub async fn near(&self, query: &NearQuery) -> Result<Vec<NearbyStore>, RepositoryError> {
        let sql = format!(
            r"
            SELECT slug, name, description, photo,
                   ST_X(location::geometry) AS lng, ST_Y(location::geometry) AS lat
            FROM directory.store
            WHERE ST_DWithin(location, {point}, $3)
            ORDER BY location <-> {point}
            LIMIT $4
            ",
            point = point_sql!("$1", "$2"),
        );
        let rows: Vec<NearbyRow> = sqlx::query_as(&sql)
            .bind(query.point.lng())
            .bind(query.point.lat())
            .bind(query.max_distance_m)
            .bind(query.limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter()
            .map(|r| {
                let location = GeoPoint::new(r.lng, r.lat).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid store location: {e}"))
                })?;
                Ok(NearbyStore {
                    slug: r.slug,
                    name: r.name,
                    description: r.description,
                    location,
                    photo: r.photo,
                })
            })
            .collect()
    }

    /// Stores with the given IDs, newest first. Unknown IDs are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<i32> = ids.iter().map(StoreId::as_i32).collect();
        let sql = format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM directory.store
            WHERE id = ANY($1)
            ORDER BY created_at DESC
            "
        );
        let rows: Vec<StoreRow> = sqlx::query_as(&sql)
            .bind(&raw)
            .fetch_all(self.pool)
            .await?;

        into_stores(rows)
    }
}

/// Escape POSIX regex metacharacters so a slug can be matched literally.
fn regex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
