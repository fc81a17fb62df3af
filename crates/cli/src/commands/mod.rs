//! CLI subcommands.
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `ADMIN_PERMISSIONS_FILE` - permission policy replacing the built-in one
//! - `CHAPTER_SESSION_FILE` - local session slot (default `~/.config/chapter/session.json`)

pub mod admin;
pub mod migrate;
pub mod policy;
pub mod session;
pub mod team;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use chapter_admin::db::RepositoryError;
use chapter_admin::services::{AdminAuthError, PolicyError, SessionStoreError};
use chapter_core::EmailError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("{0}")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A named record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Sign-in failed.
    #[error("{0}")]
    Auth(#[from] AdminAuthError),

    /// Policy file invalid.
    #[error("Invalid policy: {0}")]
    Policy(#[from] PolicyError),

    /// Local session slot unreadable or unwritable.
    #[error("Session error: {0}")]
    Session(#[from] SessionStoreError),

    /// No valid local session.
    #[error("Not signed in. Run `chapter-cli login` first.")]
    NotSignedIn,
}

/// Connect to the admin database.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    Ok(chapter_admin::db::create_pool(&SecretString::from(database_url)).await?)
}
