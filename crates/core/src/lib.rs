//! Store Directory Core - Shared domain library.
//!
//! This crate provides the types and decision logic used by the web server and
//! the CLI:
//! - `web` - Public store directory (listing, search, map, hearts)
//! - `cli` - Command-line tools for migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Handlers gather state, ask this crate what to do, and then
//! perform the I/O themselves.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, slugs and geographic points
//! - [`pagination`] - Skip/page arithmetic and out-of-range detection
//! - [`ownership`] - Author checks before mutating a store
//! - [`favorites`] - Heart toggle decisions
//! - [`query`] - Parameters for listing, tag, text and nearby lookups

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod favorites;
pub mod ownership;
pub mod pagination;
pub mod query;
pub mod types;

pub use favorites::{HeartOp, toggle_favorite};
pub use ownership::{OwnershipError, assert_owner};
pub use pagination::{Page, STORES_PER_PAGE, paginate};
pub use types::*;
