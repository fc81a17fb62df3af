//! Team and membership management commands.

use chapter_admin::db::{AdminUserRepository, TeamRepository};
use chapter_admin::models::Team;
use chapter_core::{Email, TeamRole};
use sqlx::PgPool;

use super::{CommandError, connect};

async fn find_team(pool: &PgPool, slug: &str) -> Result<Team, CommandError> {
    TeamRepository::new(pool)
        .get_team_by_slug(slug)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("team {slug}")))
}

/// Create a team.
pub async fn create(name: &str, slug: &str, color: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let team = TeamRepository::new(&pool).create_team(name, slug, color).await?;

    tracing::info!("Team created: {} ({}) id={}", team.name, team.slug, team.id);
    Ok(())
}

/// List all teams.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let teams = TeamRepository::new(&pool).list_teams().await?;

    #[allow(clippy::print_stdout)]
    {
        if teams.is_empty() {
            println!("No teams.");
        }
        for team in teams {
            println!("{:<24} {:<32} {}", team.slug, team.name, team.color);
        }
    }
    Ok(())
}

/// Delete a team and its memberships.
pub async fn delete(slug: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let team = find_team(&pool, slug).await?;
    TeamRepository::new(&pool).delete_team(team.id).await?;

    tracing::info!("Team deleted: {}", slug);
    Ok(())
}

/// Add an admin to a team, or change their role if already a member.
pub async fn add_member(team: &str, email: &str, role: &str) -> Result<(), CommandError> {
    let role: TeamRole = role.parse().map_err(CommandError::InvalidRole)?;
    let email = Email::parse(email)?;

    let pool = connect().await?;
    let team = find_team(&pool, team).await?;
    let admin = AdminUserRepository::new(&pool)
        .get_by_email(&email)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("admin {email}")))?;

    let membership = TeamRepository::new(&pool)
        .add_membership(admin.id, team.id, role)
        .await?;

    tracing::info!(
        "{} is now {} of {} (membership {})",
        email,
        membership.role,
        team.slug,
        membership.id
    );
    Ok(())
}

/// Remove an admin from a team.
pub async fn remove_member(team: &str, email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;

    let pool = connect().await?;
    let team = find_team(&pool, team).await?;
    let repo = TeamRepository::new(&pool);

    let membership = repo
        .list_members(team.id)
        .await?
        .into_iter()
        .find(|m| m.email == email.as_str())
        .ok_or_else(|| CommandError::NotFound(format!("{email} in team {}", team.slug)))?;

    repo.remove_membership(membership.membership_id).await?;

    tracing::info!("{} removed from {}", email, team.slug);
    Ok(())
}
