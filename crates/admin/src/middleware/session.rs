//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! stricter security settings (SameSite=Strict, 24hr expiry, signed cookie).

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;
use crate::models::session::SESSION_LIFETIME_HOURS;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "chapter_admin_session";

/// Create the session layer with `PostgreSQL` store.
///
/// The cookie lifetime matches the admin session lifetime. The admin session
/// itself carries a fixed expiry, so activity never extends a login.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> Result<SessionManagerLayer<PostgresStore, tower_sessions::service::SignedCookie>, sqlx::Error> {
    // The session table is created by migration in the admin schema.
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("admin")
        .map_err(|e| sqlx::Error::Configuration(e.into()))?
        .with_table_name("session")
        .map_err(|e| sqlx::Error::Configuration(e.into()))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::hours(SESSION_LIFETIME_HOURS),
        ))
        .with_secure(config.is_secure())
        // SameSite=Strict for admin
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config)))
}

/// Derive the 64-byte cookie signing key from the configured secret.
fn signing_key(config: &AdminConfig) -> Key {
    let digest = Sha512::digest(config.session_secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}
