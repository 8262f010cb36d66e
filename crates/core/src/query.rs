//! Query parameters for store lookups.
//!
//! These types describe *what* to fetch; the web crate's repository turns them
//! into SQL. Nearest-neighbour ordering, text ranking and tag aggregation are
//! left entirely to the database.

use std::num::NonZeroU64;

use crate::pagination::{Page, paginate};
use crate::types::{CoordinateError, GeoPoint};

/// Maximum results returned by a text search.
pub const TEXT_SEARCH_LIMIT: i64 = 5;

/// Maximum results returned by a nearby-stores search.
pub const NEAR_LIMIT: i64 = 10;

/// Search radius for nearby stores, in meters.
pub const NEAR_MAX_DISTANCE_M: f64 = 10_000.0;

/// One page of the full store listing, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingQuery {
    /// Rows to skip.
    pub offset: i64,
    /// Rows to return.
    pub limit: i64,
}

impl ListingQuery {
    /// Window for a requested page before the total is known.
    ///
    /// The offset only depends on the page number, so the rows and the total
    /// count can be fetched concurrently.
    #[must_use]
    pub fn for_page(requested_page: Option<i64>, page_size: NonZeroU64) -> Self {
        Self::from(&paginate(requested_page, page_size, 0))
    }
}

impl From<&Page> for ListingQuery {
    fn from(page: &Page) -> Self {
        Self {
            offset: i64::try_from(page.skip).unwrap_or(i64::MAX),
            limit: i64::try_from(page.page_size).unwrap_or(i64::MAX),
        }
    }
}

/// Which stores a tag page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    /// Stores carrying at least one tag.
    Any,
    /// Stores carrying this exact tag.
    Tag(String),
}

impl TagFilter {
    /// Build a filter from an optional path segment. Blank segments mean [`TagFilter::Any`].
    #[must_use]
    pub fn from_param(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some(t) if !t.is_empty() => Self::Tag(t.to_owned()),
            _ => Self::Any,
        }
    }

    /// The selected tag, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Tag(t) => Some(t),
        }
    }
}

/// Full-text search ranked by relevance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearch {
    /// Raw search terms, passed to the text index untouched.
    pub terms: String,
    /// Maximum rows.
    pub limit: i64,
}

impl TextSearch {
    /// Search for `terms`. Empty terms are not special-cased; the index returns nothing.
    #[must_use]
    pub fn new(terms: impl Into<String>) -> Self {
        Self {
            terms: terms.into(),
            limit: TEXT_SEARCH_LIMIT,
        }
    }
}

/// Nearest stores around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearQuery {
    /// Search origin.
    pub point: GeoPoint,
    /// Radius in meters.
    pub max_distance_m: f64,
    /// Maximum rows.
    pub limit: i64,
}

impl NearQuery {
    /// Search around an already-parsed point.
    #[must_use]
    pub const fn around(point: GeoPoint) -> Self {
        Self {
            point,
            max_distance_m: NEAR_MAX_DISTANCE_M,
            limit: NEAR_LIMIT,
        }
    }

    /// Parse `lng`/`lat` query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] if either value is not a valid coordinate.
    pub fn parse(lng: &str, lat: &str) -> Result<Self, CoordinateError> {
        GeoPoint::parse(lng, lat).map(Self::around)
    }
}
