//! URL-safe store identifier derived from a store's name.

use core::fmt;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A URL-safe slug.
///
/// Slugs are lowercase, contain only alphanumeric characters separated by
/// single dashes, and never start or end with a dash.
///
/// ## Examples
///
/// ```
/// use store_directory_core::Slug;
///
/// assert_eq!(Slug::from_name("Wes's Coffee & Donuts").as_str(), "wes-s-coffee-donuts");
/// assert_eq!(Slug::from_name("  Café   Olé ").as_str(), "café-olé");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Used when a name has no alphanumeric characters at all.
    pub const FALLBACK: &'static str = "store";

    /// Derive a slug from a display name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;

        for c in name.chars() {
            if c.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_dash = true;
            }
        }

        if slug.is_empty() {
            slug.push_str(Self::FALLBACK);
        }

        Self(slug)
    }

    /// Disambiguate a slug against the slugs other stores already use.
    ///
    /// An untaken slug is kept unchanged. Otherwise the result is `slug-{n}`
    /// for the smallest `n >= 2` not in `taken`.
    #[must_use]
    pub fn disambiguate<'a>(self, taken: impl IntoIterator<Item = &'a str>) -> Self {
        let taken: HashSet<&str> = taken.into_iter().collect();
        if !taken.contains(self.0.as_str()) {
            return self;
        }

        let free = (2_u64..)
            .map(|n| format!("{}-{n}", self.0))
            .find(|candidate| !taken.contains(candidate.as_str()));
        free.map_or(self, Self)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
