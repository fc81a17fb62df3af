//! Team and team membership repository.
//!
//! Owns no logic beyond persistence and the one-membership-per-(admin, team)
//! uniqueness rule, which is enforced by a unique constraint and upsert.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use chapter_core::{AdminUserId, MembershipId, TeamId, TeamRole};

use super::RepositoryError;
use crate::models::team::{Team, TeamMember, TeamMembership, is_valid_slug};
use crate::services::auth::MembershipStore;

/// Membership joined with its team, as returned by every membership query.
const MEMBERSHIP_SELECT: &str = r"
    SELECT m.id, m.admin_user_id, m.role, m.created_at,
           t.id AS team_id, t.name AS team_name, t.slug AS team_slug, t.color AS team_color
    FROM admin.team_membership m
    JOIN admin.team t ON t.id = m.team_id
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    slug: String,
    color: String,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Self {
            id: TeamId::new(row.id),
            name: row.name,
            slug: row.slug,
            color: row.color,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    admin_user_id: Uuid,
    role: TeamRole,
    created_at: DateTime<Utc>,
    team_id: Uuid,
    team_name: String,
    team_slug: String,
    team_color: String,
}

impl From<MembershipRow> for TeamMembership {
    fn from(row: MembershipRow) -> Self {
        Self {
            id: MembershipId::new(row.id),
            admin_user_id: AdminUserId::new(row.admin_user_id),
            team: Team {
                id: TeamId::new(row.team_id),
                name: row.team_name,
                slug: row.team_slug,
                color: row.team_color,
            },
            role: row.role,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TeamMemberRow {
    membership_id: Uuid,
    admin_user_id: Uuid,
    name: String,
    email: String,
    role: TeamRole,
}

impl From<TeamMemberRow> for TeamMember {
    fn from(row: TeamMemberRow) -> Self {
        Self {
            membership_id: MembershipId::new(row.membership_id),
            admin_user_id: AdminUserId::new(row.admin_user_id),
            name: row.name,
            email: row.email,
            role: row.role,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for teams and team memberships.
#[derive(Clone, Copy)]
pub struct TeamRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TeamRepository<'a> {
    /// Create a new team repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all teams by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_teams(&self) -> Result<Vec<Team>, RepositoryError> {
        let rows = sqlx::query_as::<_, TeamRow>(
            "SELECT id, name, slug, color FROM admin.team ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a team by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_team_by_slug(&self, slug: &str) -> Result<Option<Team>, RepositoryError> {
        let row = sqlx::query_as::<_, TeamRow>(
            "SELECT id, name, slug, color FROM admin.team WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a team.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is malformed or taken.
    pub async fn create_team(
        &self,
        name: &str,
        slug: &str,
        color: &str,
    ) -> Result<Team, RepositoryError> {
        if !is_valid_slug(slug) {
            return Err(RepositoryError::Conflict(format!("invalid team slug: {slug}")));
        }

        let row = sqlx::query_as::<_, TeamRow>(
            r"
            INSERT INTO admin.team (name, slug, color)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, color
            ",
        )
        .bind(name)
        .bind(slug)
        .bind(color)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "team slug"))?;

        Ok(row.into())
    }

    /// Delete a team and, by cascade, its memberships.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the team does not exist.
    pub async fn delete_team(&self, id: TeamId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.team WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// List a team's roster, leads first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_members(&self, team_id: TeamId) -> Result<Vec<TeamMember>, RepositoryError> {
        let rows = sqlx::query_as::<_, TeamMemberRow>(
            r"
            SELECT m.id AS membership_id, a.id AS admin_user_id, a.name, a.email, m.role
            FROM admin.team_membership m
            JOIN admin.admin_user a ON a.id = m.admin_user_id
            WHERE m.team_id = $1
            ORDER BY m.role, a.name
            ",
        )
        .bind(team_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// All memberships of an admin, joined with their teams.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_user_teams(
        &self,
        admin_id: AdminUserId,
    ) -> Result<Vec<TeamMembership>, RepositoryError> {
        let rows = sqlx::query_as::<_, MembershipRow>(&format!(
            "{MEMBERSHIP_SELECT} WHERE m.admin_user_id = $1 ORDER BY m.created_at, t.name"
        ))
        .bind(admin_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add an admin to a team, or change their role if already a member.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the admin or team does not exist.
    #[instrument(skip(self))]
    pub async fn add_membership(
        &self,
        admin_id: AdminUserId,
        team_id: TeamId,
        role: TeamRole,
    ) -> Result<TeamMembership, RepositoryError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r"
            WITH upserted AS (
                INSERT INTO admin.team_membership (admin_user_id, team_id, role)
                VALUES ($1, $2, $3)
                ON CONFLICT (admin_user_id, team_id) DO UPDATE SET role = EXCLUDED.role
                RETURNING id, admin_user_id, team_id, role, created_at
            )
            SELECT u.id, u.admin_user_id, u.role, u.created_at,
                   t.id AS team_id, t.name AS team_name, t.slug AS team_slug, t.color AS team_color
            FROM upserted u
            JOIN admin.team t ON t.id = u.team_id
            ",
        )
        .bind(admin_id)
        .bind(team_id)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "membership"))?;

        Ok(row.into())
    }

    /// Change the in-team role of a membership.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the membership does not exist.
    #[instrument(skip(self))]
    pub async fn update_role(
        &self,
        membership_id: MembershipId,
        role: TeamRole,
    ) -> Result<TeamMembership, RepositoryError> {
        let updated = sqlx::query("UPDATE admin.team_membership SET role = $2 WHERE id = $1")
            .bind(membership_id)
            .bind(role)
            .execute(self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query_as::<_, MembershipRow>(&format!("{MEMBERSHIP_SELECT} WHERE m.id = $1"))
            .bind(membership_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Remove a membership.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the membership does not exist.
    #[instrument(skip(self))]
    pub async fn remove_membership(&self, membership_id: MembershipId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.team_membership WHERE id = $1")
            .bind(membership_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl MembershipStore for TeamRepository<'_> {
    async fn get_user_teams(
        &self,
        admin_id: AdminUserId,
    ) -> Result<Vec<TeamMembership>, RepositoryError> {
        Self::get_user_teams(self, admin_id).await
    }

    async fn add_membership(
        &self,
        admin_id: AdminUserId,
        team_id: TeamId,
        role: TeamRole,
    ) -> Result<TeamMembership, RepositoryError> {
        Self::add_membership(self, admin_id, team_id, role).await
    }

    async fn update_role(
        &self,
        membership_id: MembershipId,
        role: TeamRole,
    ) -> Result<TeamMembership, RepositoryError> {
        Self::update_role(self, membership_id, role).await
    }

    async fn remove_membership(&self, membership_id: MembershipId) -> Result<(), RepositoryError> {
        Self::remove_membership(self, membership_id).await
    }
}
