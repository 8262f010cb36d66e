//! Domain models for the directory.

pub mod session;
pub mod store;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use store::{NearbyStore, NewStore, SearchHit, Store, StoreChanges, TagCount};
pub use user::User;
