//! Session-related types.
//!
//! Types stored in the session for identity and flash messages.

use serde::{Deserialize, Serialize};

use store_directory_core::UserId;

/// Session-stored user identity.
///
/// Written by the upstream login flow; this crate only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";
}
