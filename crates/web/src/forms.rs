//! Store add/edit form parsing.
//!
//! The form is posted as `multipart/form-data` so it can carry a photo.
//! Field names follow the nested-bracket convention used by the edit template:
//!
//! ```text
//! name
//! description
//! tags                      (repeated, one per checked box)
//! location[address]
//! location[coordinates][0]  (longitude)
//! location[coordinates][1]  (latitude)
//! photo                     (optional file)
//! ```

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use bytes::Bytes;
use thiserror::Error;

use store_directory_core::{CoordinateError, GeoPoint, UserId};

use crate::models::{NewStore, StoreChanges};

/// Tags offered as checkboxes on the edit form.
pub const AVAILABLE_TAGS: [&str; 5] = [
    "Wifi",
    "Open Late",
    "Family Friendly",
    "Vegetarian",
    "Licensed",
];

/// Errors that can occur while reading the store form.
#[derive(Debug, Error)]
pub enum FormError {
    /// A required field was absent or blank.
    #[error("You must supply a {0}!")]
    MissingField(&'static str),

    /// The coordinates could not be parsed.
    #[error("invalid coordinates: {0}")]
    Coordinates(#[from] CoordinateError),

    /// The multipart body was malformed or too large.
    #[error("invalid form body: {0}")]
    Multipart(#[from] MultipartError),
}

/// An uploaded file that still needs ingesting.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Declared MIME type of the part.
    pub content_type: String,
    /// Raw bytes.
    pub bytes: Bytes,
}

/// A validated store form.
#[derive(Debug, Clone)]
pub struct StoreForm {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub location: GeoPoint,
    /// `None` when no file was chosen.
    pub photo: Option<PhotoUpload>,
}

impl StoreForm {
    /// Read every part of a multipart body into a form.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Multipart` if the body cannot be read, or a
    /// validation error from [`StoreFormBuilder::build`].
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, FormError> {
        let mut builder = StoreFormBuilder::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == "photo" {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field.bytes().await?;
                builder.photo(content_type, bytes);
            } else {
                let value = field.text().await?;
                builder.text(&name, value);
            }
        }

        builder.build()
    }

    /// Values for inserting this form as a new store.
    #[must_use]
    pub fn into_new_store(self, author: UserId, photo: Option<String>) -> NewStore {
        NewStore {
            name: self.name,
            description: self.description,
            tags: self.tags,
            location: self.location,
            address: self.address,
            photo,
            author,
        }
    }

    /// Values for updating an existing store. `photo: None` keeps the current photo.
    #[must_use]
    pub fn into_changes(self, photo: Option<String>) -> StoreChanges {
        StoreChanges {
            name: self.name,
            description: self.description,
            tags: self.tags,
            location: self.location,
            address: self.address,
            photo,
        }
    }
}

/// Accumulates form fields as they stream in.
#[derive(Debug, Default)]
pub struct StoreFormBuilder {
    name: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    address: Option<String>,
    lng: Option<String>,
    lat: Option<String>,
    photo: Option<PhotoUpload>,
}

impl StoreFormBuilder {
    /// Record a text field. Unknown fields are ignored.
    pub fn text(&mut self, field: &str, value: String) -> &mut Self {
        match field {
            "name" => self.name = Some(value),
            "description" => self.description = Some(value),
            "tags" | "tags[]" => {
                let tag = value.trim();
                if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
                    self.tags.push(tag.to_owned());
                }
            }
            "location[address]" => self.address = Some(value),
            "location[coordinates][0]" => self.lng = Some(value),
            "location[coordinates][1]" => self.lat = Some(value),
            _ => tracing::debug!(field, "Ignoring unknown form field"),
        }
        self
    }

    /// Record the photo part. An empty part means no file was chosen.
    pub fn photo(&mut self, content_type: String, bytes: Bytes) -> &mut Self {
        self.photo = (!bytes.is_empty()).then_some(PhotoUpload {
            content_type,
            bytes,
        });
        self
    }

    /// Validate the collected fields.
    ///
    /// # Errors
    ///
    /// Returns `FormError::MissingField` for a blank name, address or
    /// coordinate, and `FormError::Coordinates` for unparseable coordinates.
    pub fn build(self) -> Result<StoreForm, FormError> {
        let name = required(self.name, "name")?;
        let address = required(self.address, "address")?;
        let lng = required(self.lng, "longitude")?;
        let lat = required(self.lat, "latitude")?;
        let location = GeoPoint::parse(&lng, &lat)?;

        Ok(StoreForm {
            name,
            description: self.description.unwrap_or_default().trim().to_owned(),
            tags: self.tags,
            address,
            location,
            photo: self.photo,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, FormError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(FormError::MissingField(field))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled() -> StoreFormBuilder {
        let mut builder = StoreFormBuilder::default();
        builder
            .text("name", "  Corner Coffee ".to_owned())
            .text("description", "Good beans".to_owned())
            .text("location[address]", "1 Main St".to_owned())
            .text("location[coordinates][0]", "-79.38".to_owned())
            .text("location[coordinates][1]", "43.65".to_owned());
        builder
    }

    #[test]
    fn test_build_trims_and_parses() {
        let form = filled().build().unwrap();
        assert_eq!(form.name, "Corner Coffee");
        assert_eq!(form.address, "1 Main St");
        assert!((form.location.lng() - -79.38).abs() < f64::EPSILON);
        assert!((form.location.lat() - 43.65).abs() < f64::EPSILON);
        assert!(form.photo.is_none());
    }

    #[test]
    fn test_tags_are_a_set() {
        let mut builder = filled();
        builder
            .text("tags", "Wifi".to_owned())
            .text("tags", "Licensed".to_owned())
            .text("tags", "Wifi".to_owned())
            .text("tags", " ".to_owned());
        let form = builder.build().unwrap();
        assert_eq!(form.tags, vec!["Wifi", "Licensed"]);
    }

    #[test]
    fn test_missing_name() {
        let mut builder = filled();
        builder.text("name", "   ".to_owned());
        assert!(matches!(
            builder.build(),
            Err(FormError::MissingField("name"))
        ));
    }

    #[test]
    fn test_bad_coordinates() {
        let mut builder = filled();
        builder.text("location[coordinates][0]", "abc".to_owned());
        assert!(matches!(builder.build(), Err(FormError::Coordinates(_))));
    }

    #[test]
    fn test_empty_photo_is_no_photo() {
        let mut builder = filled();
        builder.photo("application/octet-stream".to_owned(), Bytes::new());
        assert!(builder.build().unwrap().photo.is_none());
    }

    #[test]
    fn test_photo_kept_with_content_type() {
        let mut builder = filled();
        builder.photo("image/png".to_owned(), Bytes::from_static(b"\x89PNG"));
        let photo = builder.build().unwrap().photo.unwrap();
        assert_eq!(photo.content_type, "image/png");
        assert_eq!(photo.bytes.len(), 4);
    }

    #[test]
    fn test_into_changes_keeps_photo_choice() {
        let changes = filled().build().unwrap().into_changes(None);
        assert!(changes.photo.is_none());
        assert_eq!(changes.name, "Corner Coffee");
    }

    #[test]
    fn test_into_new_store_sets_author() {
        let store = filled()
            .build()
            .unwrap()
            .into_new_store(UserId::new(7), Some("t-1.png".to_owned()));
        assert_eq!(store.author, UserId::new(7));
        assert_eq!(store.photo.as_deref(), Some("t-1.png"));
    }
}
