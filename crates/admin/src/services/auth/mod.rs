//! Admin identity provider.
//!
//! [`AdminContext`] owns the authenticated identity for one session slot
//! (a browser session or a CLI profile). It is constructed explicitly with
//! its stores and policy and restored with [`AdminContext::restore_session`].
//!
//! Every failure resolves to a restrictive state: a slot that cannot be read
//! or validated means logged out, a membership fetch that fails means no
//! teams, and a permission check that cannot fetch fresh data means deny.

mod error;
mod memory;
mod store;

pub use error::AdminAuthError;
pub use memory::MemoryDirectory;
pub use store::{IdentityStore, MembershipStore};

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use tracing::{debug, error, info, instrument, warn};

use chapter_core::{Action, Email, Resource, TeamId};

use crate::db::RepositoryError;
use crate::models::{AdminIdentity, AdminUser, CurrentAdmin, StoredSession, TeamMembership};
use crate::services::permissions::{self, PermissionPolicy};
use crate::services::session_store::{SessionStore, SessionStoreError};

#[derive(Debug, Clone)]
struct AuthState {
    admin: AdminUser,
    teams: Vec<TeamMembership>,
    current_team: Option<TeamId>,
}

/// Identity provider for one session slot.
pub struct AdminContext<S, I, M> {
    sessions: S,
    identities: I,
    memberships: M,
    policy: Arc<PermissionPolicy>,
    state: Option<AuthState>,
}

impl<S, I, M> AdminContext<S, I, M>
where
    S: SessionStore,
    I: IdentityStore,
    M: MembershipStore,
{
    /// Create a logged-out context. Call [`Self::restore_session`] before use.
    #[must_use]
    pub const fn new(sessions: S, identities: I, memberships: M, policy: Arc<PermissionPolicy>) -> Self {
        Self {
            sessions,
            identities,
            memberships,
            policy,
            state: None,
        }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Restore the identity from the session slot.
    ///
    /// Returns true if the slot holds a valid session for an active admin.
    /// Invalid, expired or orphaned slots are cleared. Store failures leave
    /// the context logged out but keep the slot for the next attempt.
    #[instrument(skip(self))]
    pub async fn restore_session(&mut self) -> bool {
        self.state = None;

        let stored = match self.sessions.load().await {
            Ok(Some(stored)) => stored,
            Ok(None) => return false,
            Err(SessionStoreError::Malformed(e)) => {
                warn!(error = %e, "Discarding unreadable session");
                self.discard_slot().await;
                return false;
            }
            Err(e) => {
                error!(error = %e, "Session slot unavailable during restore");
                return false;
            }
        };

        let Some(admin_id) = stored.valid_admin_id(Utc::now()) else {
            debug!("Discarding expired or invalid session");
            self.discard_slot().await;
            return false;
        };

        let admin = match self.identities.get_admin_by_id(admin_id).await {
            Ok(Some(admin)) if admin.is_active => admin,
            Ok(_) => {
                info!(%admin_id, "Discarding session for missing or inactive admin");
                self.discard_slot().await;
                return false;
            }
            Err(e) => {
                error!(%admin_id, error = %e, "Failed to load admin during session restore");
                return false;
            }
        };

        self.load_identity(admin).await;
        true
    }

    /// Verify credentials and start a new session.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for every credential
    /// failure, including a malformed email. Returns `Store` or `Session` if
    /// the identity store or session slot is unavailable.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &SecretString) -> Result<(), AdminAuthError> {
        self.state = None;

        let Ok(email) = Email::parse(email) else {
            return Err(AdminAuthError::InvalidCredentials);
        };

        let admin = self
            .identities
            .authenticate_admin(&email, password)
            .await
            .map_err(AdminAuthError::Store)?
            .filter(|admin| admin.is_active)
            .ok_or(AdminAuthError::InvalidCredentials)?;

        let stored = StoredSession::issue(&admin, Utc::now());
        self.sessions
            .save(&stored)
            .await
            .map_err(AdminAuthError::Session)?;

        info!(admin_id = %admin.id, "Admin logged in");
        self.load_identity(admin).await;
        Ok(())
    }

    /// Clear the session and in-memory identity. Safe to call when logged out.
    pub async fn logout(&mut self) {
        if let Some(state) = self.state.take() {
            info!(admin_id = %state.admin.id, "Admin logged out");
        }
        self.discard_slot().await;
    }

    /// Re-read the admin's memberships after a membership change.
    ///
    /// The current team is kept if the admin still belongs to it, otherwise
    /// the first membership is selected.
    pub async fn refresh_teams(&mut self) {
        let Some(admin_id) = self.state.as_ref().map(|s| s.admin.id) else {
            return;
        };

        let teams = self.fetch_teams_or_empty(admin_id).await;
        if let Some(state) = self.state.as_mut() {
            let keep = state
                .current_team
                .filter(|id| teams.iter().any(|m| m.team.id == *id));
            state.current_team = keep.or_else(|| teams.first().map(|m| m.team.id));
            state.teams = teams;
        }
    }

    async fn load_identity(&mut self, admin: AdminUser) {
        let teams = self.fetch_teams_or_empty(admin.id).await;
        let current_team = teams.first().map(|m| m.team.id);
        self.state = Some(AuthState {
            admin,
            teams,
            current_team,
        });
    }

    async fn fetch_teams_or_empty(&self, admin_id: chapter_core::AdminUserId) -> Vec<TeamMembership> {
        match self.memberships.get_user_teams(admin_id).await {
            Ok(teams) => teams,
            Err(e) => {
                warn!(%admin_id, error = %e, "Failed to load team memberships");
                Vec::new()
            }
        }
    }

    async fn discard_slot(&self) {
        if let Err(e) = self.sessions.clear().await {
            warn!(error = %e, "Failed to clear session slot");
        }
    }

    // =========================================================================
    // Readable state
    // =========================================================================

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.is_some()
    }

    #[must_use]
    pub fn current_admin(&self) -> Option<&AdminUser> {
        self.state.as_ref().map(|s| &s.admin)
    }

    /// Identity snapshot built from the cached memberships.
    #[must_use]
    pub fn identity(&self) -> Option<AdminIdentity> {
        self.state
            .as_ref()
            .map(|s| AdminIdentity::new(s.admin.clone(), &s.teams))
    }

    #[must_use]
    pub fn user_teams(&self) -> &[TeamMembership] {
        self.state.as_ref().map_or(&[], |s| s.teams.as_slice())
    }

    #[must_use]
    pub fn current_team(&self) -> Option<&TeamMembership> {
        let state = self.state.as_ref()?;
        let current = state.current_team?;
        state.teams.iter().find(|m| m.team.id == current)
    }

    /// Select the current team. Returns false if the admin is not a member.
    pub fn set_current_team(&mut self, team_id: TeamId) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if !state.teams.iter().any(|m| m.team.id == team_id) {
            return false;
        }
        state.current_team = Some(team_id);
        true
    }

    /// Snapshot of the authenticated admin for request handlers.
    #[must_use]
    pub fn current(&self) -> Option<CurrentAdmin> {
        let state = self.state.as_ref()?;
        Some(CurrentAdmin {
            identity: AdminIdentity::new(state.admin.clone(), &state.teams),
            teams: state.teams.clone(),
            current_team: state.current_team,
        })
    }

    #[must_use]
    pub const fn policy(&self) -> &Arc<PermissionPolicy> {
        &self.policy
    }

    /// The membership registry this context reads from.
    #[must_use]
    pub const fn membership_registry(&self) -> &M {
        &self.memberships
    }

    // =========================================================================
    // Permission checks
    // =========================================================================

    /// Build an identity from freshly fetched memberships.
    ///
    /// The cached team list is updated as a side effect.
    async fn fresh_identity(&mut self) -> Result<Option<AdminIdentity>, RepositoryError> {
        let Some(admin_id) = self.state.as_ref().map(|s| s.admin.id) else {
            return Ok(None);
        };

        let teams = self.memberships.get_user_teams(admin_id).await?;
        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };
        let identity = AdminIdentity::new(state.admin.clone(), &teams);
        if state.current_team.is_none_or(|id| !teams.iter().any(|m| m.team.id == id)) {
            state.current_team = teams.first().map(|m| m.team.id);
        }
        state.teams = teams;
        Ok(Some(identity))
    }

    /// Check whether the current admin may perform `action` on `resource`.
    pub async fn has_permission(&mut self, resource: Resource, action: Action) -> bool {
        match self.fresh_identity().await {
            Ok(identity) => permissions::has_permission(&self.policy, identity.as_ref(), resource, action),
            Err(e) => {
                error!(%resource, %action, error = %e, "Permission check failed");
                false
            }
        }
    }

    /// Check a team-specific permission: only a membership in `team_slug` counts.
    pub async fn has_team_permission(&mut self, resource: Resource, action: Action, team_slug: &str) -> bool {
        match self.fresh_identity().await {
            Ok(identity) => permissions::has_team_permission(
                &self.policy,
                identity.as_ref(),
                resource,
                action,
                team_slug,
            ),
            Err(e) => {
                error!(%resource, %action, team_slug, error = %e, "Permission check failed");
                false
            }
        }
    }

    /// Check whether the current admin may open `path`.
    pub async fn can_access_page(&mut self, path: &str) -> bool {
        self.check_page_access(path).await.unwrap_or_else(|e| {
            error!(path, error = %e, "Permission check failed");
            false
        })
    }

    /// Like [`Self::can_access_page`], but reports fetch failures to the caller.
    ///
    /// Paths outside `/admin` never touch the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the membership list cannot be fetched.
    pub async fn check_page_access(&mut self, path: &str) -> Result<bool, RepositoryError> {
        if !permissions::is_admin_path(path) {
            return Ok(true);
        }
        let identity = self.fresh_identity().await?;
        Ok(permissions::can_access_page(&self.policy, identity.as_ref(), path))
    }
}
