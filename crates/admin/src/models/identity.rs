//! Runtime identity consumed by the permission evaluator.

use chapter_core::{AdminRole, TeamId};

use super::admin_user::AdminUser;
use super::team::TeamMembership;

/// Effective role of an authenticated admin.
///
/// Team members carry the memberships their access derives from, so the
/// evaluator can only reach them through this variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    Admin,
    TeamMember(Vec<TeamMembership>),
}

impl Role {
    /// Build the effective role from the stored flag and current memberships.
    #[must_use]
    pub fn from_parts(role: AdminRole, memberships: &[TeamMembership]) -> Self {
        match role {
            AdminRole::SuperAdmin => Self::SuperAdmin,
            AdminRole::Admin => Self::Admin,
            AdminRole::TeamMember => Self::TeamMember(memberships.to_vec()),
        }
    }
}

/// Snapshot of an authenticated admin for a single permission evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    user: AdminUser,
    role: Role,
}

impl AdminIdentity {
    #[must_use]
    pub fn new(user: AdminUser, memberships: &[TeamMembership]) -> Self {
        let role = Role::from_parts(user.role, memberships);
        Self { user, role }
    }

    #[must_use]
    pub const fn user(&self) -> &AdminUser {
        &self.user
    }

    #[must_use]
    pub const fn role(&self) -> &Role {
        &self.role
    }

    #[must_use]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self.role, Role::SuperAdmin)
    }

    /// True for admins and super admins (`is_super_admin` implies `is_admin`).
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::SuperAdmin | Role::Admin)
    }
}

/// The admin attached to a request that passed the page guard.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub identity: AdminIdentity,
    pub teams: Vec<TeamMembership>,
    pub current_team: Option<TeamId>,
}

impl CurrentAdmin {
    /// The membership for the selected team, if any.
    #[must_use]
    pub fn current_membership(&self) -> Option<&TeamMembership> {
        let current = self.current_team?;
        self.teams.iter().find(|m| m.team.id == current)
    }
}
