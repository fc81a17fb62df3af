//! Settings database operations.
//!
//! Site-wide settings stored as JSONB under a string key.

use serde_json::Value as JsonValue;
use sqlx::PgPool;

use super::RepositoryError;
use crate::services::site_status::{SITE_STATUS_KEY, SiteStatus, SiteStatusSource};

/// Repository for site-wide settings.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a setting value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_setting(&self, key: &str) -> Result<Option<JsonValue>, RepositoryError> {
        let value = sqlx::query_scalar::<_, JsonValue>(
            "SELECT value FROM admin.settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// Set a setting value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_setting(&self, key: &str, value: &JsonValue) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO admin.settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl SiteStatusSource for SettingsRepository {
    async fn fetch_status(&self) -> Result<SiteStatus, RepositoryError> {
        // Never having set a status is the normal state of a fresh install.
        let Some(value) = self.get_setting(SITE_STATUS_KEY).await? else {
            return Ok(SiteStatus::Online);
        };

        serde_json::from_value(value)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid site status: {e}")))
    }
}
