//! One-shot flash messages stored in the session.
//!
//! Handlers push a message before redirecting; the next rendered page takes
//! every pending message, which removes them from the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Severity of a flash message. Also used as its CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    /// Returns the level as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A link shown after a flash message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashLink {
    pub href: String,
    pub label: String,
}

/// A pending flash message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<FlashLink>,
}

impl Flash {
    /// A plain flash message.
    #[must_use]
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            link: None,
        }
    }

    /// Attach a link rendered after the message.
    #[must_use]
    pub fn with_link(mut self, href: impl Into<String>, label: impl Into<String>) -> Self {
        self.link = Some(FlashLink {
            href: href.into(),
            label: label.into(),
        });
        self
    }
}

/// Queue a flash message for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn push_flash(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    queue_flash(session, Flash::new(level, message)).await
}

/// Queue a prepared flash, such as one carrying a link.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn queue_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<Flash> = session
        .get(session_keys::FLASH)
        .await?
        .unwrap_or_default();
    pending.push(flash);
    session.insert(session_keys::FLASH, pending).await
}

/// Take every pending flash message, leaving none behind.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn take_flashes(session: &Session) -> Result<Vec<Flash>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<Flash>>(session_keys::FLASH)
        .await?
        .unwrap_or_default())
}
