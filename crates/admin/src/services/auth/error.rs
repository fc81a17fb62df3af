//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::session_store::SessionStoreError;

/// Errors that can occur during admin authentication operations.
///
/// Display strings are safe to show to users: credential failures never say
/// whether the email exists, and outages never expose the underlying cause.
/// The cause stays reachable through `source()` for logging.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Unknown email, wrong password, malformed email or inactive account.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The identity store could not be queried.
    #[error("Sign-in is temporarily unavailable")]
    Store(#[source] RepositoryError),

    /// The session slot could not be written.
    #[error("Sign-in is temporarily unavailable")]
    Session(#[source] SessionStoreError),
}
