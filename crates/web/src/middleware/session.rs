//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::DirectoryConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "sd_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Derive the cookie signing key from the configured session secret.
///
/// `Key` needs 64 bytes of material; the SHA-512 digest of the secret supplies
/// exactly that.
#[must_use]
pub fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session layer with `PostgreSQL` store.
///
/// Session cookies are signed with a key derived from
/// `DIRECTORY_SESSION_SECRET`. The `tower_sessions.session` table is created
/// by `sd-cli migrate`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &DirectoryConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_stable_for_a_secret() {
        let secret = SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6");
        assert_eq!(signing_key(&secret).master(), signing_key(&secret).master());
    }

    #[test]
    fn test_signing_key_differs_per_secret() {
        let first = signing_key(&SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"));
        let second = signing_key(&SecretString::from("Zq8!vN1@cX4#bM7$lK0%jH3^gF6&dS9"));
        assert_ne!(first.master(), second.master());
    }

    #[test]
    fn test_signing_key_uses_full_digest() {
        let key = signing_key(&SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"));
        assert_eq!(key.master().len(), 64);
    }
}
