//! In-memory identity store and membership registry.
//!
//! Used by tests and local demos in place of the hosted database. Clones
//! share the same directory. Passwords are kept only as SHA-256 digests, but
//! this is not a production credential store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use chapter_core::{AdminRole, AdminUserId, Email, MembershipId, TeamId, TeamRole};

use super::store::{IdentityStore, MembershipStore};
use crate::db::RepositoryError;
use crate::models::{AdminUser, Team, TeamMembership};

#[derive(Debug, Clone)]
struct MembershipRecord {
    id: MembershipId,
    admin_user_id: AdminUserId,
    team_id: TeamId,
    role: TeamRole,
    created_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Directory {
    admins: HashMap<AdminUserId, (AdminUser, String)>,
    teams: HashMap<TeamId, Team>,
    memberships: Vec<MembershipRecord>,
    offline: bool,
}

impl Directory {
    fn check_online(&self) -> Result<(), RepositoryError> {
        if self.offline {
            return Err(RepositoryError::Unavailable("directory offline".to_string()));
        }
        Ok(())
    }

    fn hydrate(&self, record: &MembershipRecord) -> Result<TeamMembership, RepositoryError> {
        let team = self
            .teams
            .get(&record.team_id)
            .cloned()
            .ok_or_else(|| RepositoryError::DataCorruption("membership without team".into()))?;

        Ok(TeamMembership {
            id: record.id,
            admin_user_id: record.admin_user_id,
            team,
            role: record.role,
            created_at: record.created_at,
        })
    }
}

/// Shared in-memory directory of admins, teams and memberships.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<RwLock<Directory>>,
}

fn digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Directory> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Directory> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an active admin with a password.
    #[must_use]
    pub fn add_admin(&self, email: Email, name: &str, role: AdminRole, password: &str) -> AdminUser {
        let now = Utc::now();
        let admin = AdminUser {
            id: AdminUserId::generate(),
            email,
            name: name.to_string(),
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.write()
            .admins
            .insert(admin.id, (admin.clone(), digest(password)));
        admin
    }

    /// Activate or deactivate an admin. Returns false if the admin is unknown.
    pub fn set_active(&self, id: AdminUserId, active: bool) -> bool {
        let mut dir = self.write();
        dir.admins.get_mut(&id).is_some_and(|(admin, _)| {
            admin.is_active = active;
            admin.updated_at = Utc::now();
            true
        })
    }

    /// Delete an admin and their memberships.
    pub fn remove_admin(&self, id: AdminUserId) {
        let mut dir = self.write();
        dir.admins.remove(&id);
        dir.memberships.retain(|m| m.admin_user_id != id);
    }

    /// Create a team.
    #[must_use]
    pub fn add_team(&self, name: &str, slug: &str, color: &str) -> Team {
        let team = Team {
            id: TeamId::generate(),
            name: name.to_string(),
            slug: slug.to_string(),
            color: color.to_string(),
        };
        self.write().teams.insert(team.id, team.clone());
        team
    }

    /// Simulate the store becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.write().offline = offline;
    }
}

impl IdentityStore for MemoryDirectory {
    async fn authenticate_admin(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Option<AdminUser>, RepositoryError> {
        let mut dir = self.write();
        dir.check_online()?;

        let expected = digest(password.expose_secret());
        let found = dir
            .admins
            .values_mut()
            .find(|(admin, hash)| admin.email == *email && admin.is_active && *hash == expected);

        Ok(found.map(|(admin, _)| {
            admin.last_login_at = Some(Utc::now());
            admin.clone()
        }))
    }

    async fn get_admin_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let dir = self.read();
        dir.check_online()?;
        Ok(dir.admins.get(&id).map(|(admin, _)| admin.clone()))
    }
}

impl MembershipStore for MemoryDirectory {
    async fn get_user_teams(
        &self,
        admin_id: AdminUserId,
    ) -> Result<Vec<TeamMembership>, RepositoryError> {
        let dir = self.read();
        dir.check_online()?;
        dir.memberships
            .iter()
            .filter(|m| m.admin_user_id == admin_id)
            .map(|m| dir.hydrate(m))
            .collect()
    }

    async fn add_membership(
        &self,
        admin_id: AdminUserId,
        team_id: TeamId,
        role: TeamRole,
    ) -> Result<TeamMembership, RepositoryError> {
        let mut dir = self.write();
        dir.check_online()?;

        if !dir.admins.contains_key(&admin_id) || !dir.teams.contains_key(&team_id) {
            return Err(RepositoryError::Conflict(
                "membership references a missing record".to_string(),
            ));
        }

        let existing = dir
            .memberships
            .iter_mut()
            .find(|m| m.admin_user_id == admin_id && m.team_id == team_id);

        let record = if let Some(existing) = existing {
            existing.role = role;
            existing.clone()
        } else {
            let record = MembershipRecord {
                id: MembershipId::generate(),
                admin_user_id: admin_id,
                team_id,
                role,
                created_at: Utc::now(),
            };
            dir.memberships.push(record.clone());
            record
        };

        dir.hydrate(&record)
    }

    async fn update_role(
        &self,
        membership_id: MembershipId,
        role: TeamRole,
    ) -> Result<TeamMembership, RepositoryError> {
        let mut dir = self.write();
        dir.check_online()?;

        let record = dir
            .memberships
            .iter_mut()
            .find(|m| m.id == membership_id)
            .ok_or(RepositoryError::NotFound)?;
        record.role = role;
        let record = record.clone();

        dir.hydrate(&record)
    }

    async fn remove_membership(&self, membership_id: MembershipId) -> Result<(), RepositoryError> {
        let mut dir = self.write();
        dir.check_online()?;

        let before = dir.memberships.len();
        dir.memberships.retain(|m| m.id != membership_id);
        if dir.memberships.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
