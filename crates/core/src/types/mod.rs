//! Core types for the store directory.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod geo;
pub mod id;
pub mod slug;

pub use geo::{CoordinateError, GeoPoint};
pub use id::*;
pub use slug::Slug;
