//! Storage seams consumed by the admin context.
//!
//! The hosted database implements both traits (see [`crate::db`]); tests and
//! local demos use [`super::memory::MemoryDirectory`].

use std::future::Future;

use secrecy::SecretString;

use chapter_core::{AdminUserId, Email, MembershipId, TeamId, TeamRole};

use crate::db::RepositoryError;
use crate::models::{AdminUser, TeamMembership};

/// External identity store: credential checks and admin lookups.
pub trait IdentityStore: Send + Sync {
    /// Verify credentials. `Ok(None)` covers every kind of rejection.
    fn authenticate_admin(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<Option<AdminUser>, RepositoryError>> + Send;

    fn get_admin_by_id(
        &self,
        id: AdminUserId,
    ) -> impl Future<Output = Result<Option<AdminUser>, RepositoryError>> + Send;
}

/// Team membership registry.
///
/// At most one membership exists per (admin, team); `add_membership` on an
/// existing pair updates its role.
pub trait MembershipStore: Send + Sync {
    fn get_user_teams(
        &self,
        admin_id: AdminUserId,
    ) -> impl Future<Output = Result<Vec<TeamMembership>, RepositoryError>> + Send;

    fn add_membership(
        &self,
        admin_id: AdminUserId,
        team_id: TeamId,
        role: TeamRole,
    ) -> impl Future<Output = Result<TeamMembership, RepositoryError>> + Send;

    fn update_role(
        &self,
        membership_id: MembershipId,
        role: TeamRole,
    ) -> impl Future<Output = Result<TeamMembership, RepositoryError>> + Send;

    fn remove_membership(
        &self,
        membership_id: MembershipId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
