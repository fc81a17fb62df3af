//! Admin user repository for database operations.
//!
//! Password hashing and verification happen inside the database via
//! `pgcrypto` (`crypt()` / `gen_salt('bf')`). Plaintext passwords are only
//! ever bound as query parameters.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use chapter_core::{AdminUserId, Email};

use super::RepositoryError;
use crate::models::admin_user::{AdminRole, AdminUser};
use crate::services::auth::IdentityStore;

const ADMIN_USER_COLUMNS: &str =
    "id, email, name, role, is_active, last_login_at, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` admin user queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: Uuid,
    email: String,
    name: String,
    role: AdminRole,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AdminUserId::new(row.id),
            email,
            name: row.name,
            role: row.role,
            is_active: row.is_active,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for admin user database operations.
#[derive(Clone, Copy)]
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all admin users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {ADMIN_USER_COLUMNS} FROM admin.admin_user ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an admin user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {ADMIN_USER_COLUMNS} FROM admin.admin_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an admin user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {ADMIN_USER_COLUMNS} FROM admin.admin_user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Verify credentials and stamp `last_login_at` in one statement.
    ///
    /// Returns `None` when the email is unknown, the password is wrong or the
    /// account is inactive. The three cases are indistinguishable to callers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn authenticate(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            r"
            UPDATE admin.admin_user
            SET last_login_at = NOW()
            WHERE email = $1
              AND is_active
              AND password_hash = crypt($2, password_hash)
            RETURNING {ADMIN_USER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(password.expose_secret())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new admin user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        role: AdminRole,
        password: &SecretString,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            r"
            INSERT INTO admin.admin_user (email, name, role, password_hash)
            VALUES ($1, $2, $3, crypt($4, gen_salt('bf')))
            RETURNING {ADMIN_USER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(name)
        .bind(role)
        .bind(password.expose_secret())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "admin email"))?;

        row.try_into()
    }

    /// Activate or deactivate an admin.
    ///
    /// Deactivated admins cannot log in, and their existing sessions are
    /// discarded on the next restore.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no admin has this email.
    pub async fn set_active(&self, email: &Email, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE admin.admin_user SET is_active = $2, updated_at = NOW() WHERE email = $1",
        )
        .bind(email.as_str())
        .bind(active)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl IdentityStore for AdminUserRepository<'_> {
    async fn authenticate_admin(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Option<AdminUser>, RepositoryError> {
        self.authenticate(email, password).await
    }

    async fn get_admin_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        self.get_by_id(id).await
    }
}
