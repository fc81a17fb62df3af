//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use tower_sessions::Session;

use crate::config::AdminConfig;
use crate::db::{AdminUserRepository, SettingsRepository, TeamRepository};
use crate::services::auth::AdminContext;
use crate::services::permissions::PermissionPolicy;
use crate::services::session_store::CookieSessionStore;
use crate::services::site_status::SiteStatusService;

/// Identity provider for one request, backed by the cookie session and the database.
pub type RequestContext<'a> =
    AdminContext<CookieSessionStore, AdminUserRepository<'a>, TeamRepository<'a>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    policy: Arc<PermissionPolicy>,
    site_status: SiteStatusService<SettingsRepository>,
}

impl AppState {
    /// Build the application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool, policy: PermissionPolicy) -> Self {
        let site_status =
            SiteStatusService::new(SettingsRepository::new(pool.clone()), config.site_status_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                policy: Arc::new(policy),
                site_status,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn policy(&self) -> &Arc<PermissionPolicy> {
        &self.inner.policy
    }

    #[must_use]
    pub fn site_status(&self) -> &SiteStatusService<SettingsRepository> {
        &self.inner.site_status
    }

    /// Settings repository over the shared pool.
    #[must_use]
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.inner.pool.clone())
    }

    /// A fresh, logged-out identity provider for the request's session.
    ///
    /// Call `restore_session` before reading identity from it.
    #[must_use]
    pub fn admin_context(&self, session: Session) -> RequestContext<'_> {
        AdminContext::new(
            CookieSessionStore::new(session),
            AdminUserRepository::new(&self.inner.pool),
            TeamRepository::new(&self.inner.pool),
            Arc::clone(&self.inner.policy),
        )
    }
}
