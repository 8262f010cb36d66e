//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, one hub per request)
//! 2. `TraceLayer` (request tracing)
//! 3. Body limit (multipart uploads)
//! 4. Session layer (tower-sessions with `PostgreSQL` store, signed cookies)
//!
//! Identity is resolved per handler through the [`Identity`] extractor.

pub mod auth;
pub mod flash;
pub mod session;

pub use auth::{AuthRejection, Identity, OptionalIdentity};
pub use flash::{Flash, FlashLevel, FlashLink, push_flash, queue_flash, take_flashes};
pub use session::create_session_layer;
