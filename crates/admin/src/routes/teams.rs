//! Team roster management.
//!
//! The guard has already required `teams/manage` on the named team before any
//! of these handlers runs, so they only check that the membership being
//! changed belongs to that team.
//!
//! After a change the acting admin's own teams are re-read and the current
//! team stored in the session is updated, since removing or demoting
//! themselves can invalidate it.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use chapter_core::{Email, MembershipId, TeamRole};

use crate::db::{AdminUserRepository, TeamRepository};
use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, Team, session_keys};
use crate::services::auth::{AdminContext, IdentityStore, MembershipStore};
use crate::services::session_store::{SessionStore, SessionStoreError};
use crate::state::{AppState, RequestContext};

const ROLES: [TeamRole; 3] = [TeamRole::Lead, TeamRole::CoLead, TeamRole::Member];

/// One option in a member's role selector.
#[derive(Debug, Clone)]
pub struct RoleOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Roster row.
#[derive(Debug, Clone)]
pub struct MemberView {
    pub name: String,
    pub email: String,
    pub membership_id: String,
    pub role_options: Vec<RoleOption>,
}

/// Team roster template.
#[derive(Template)]
#[template(path = "admin/team_members.html")]
pub struct TeamMembersTemplate {
    pub admin_name: String,
    pub team_name: String,
    pub team_slug: String,
    pub members: Vec<MemberView>,
    pub roles: Vec<&'static str>,
}

#[derive(Deserialize)]
pub struct AddMemberForm {
    email: String,
    role: String,
}

#[derive(Deserialize)]
pub struct RoleForm {
    role: String,
}

/// Build the team management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/teams/{team}/members", get(members).post(add_member))
        .route("/admin/teams/{team}/members/{id}/role", post(update_role))
        .route("/admin/teams/{team}/members/{id}/remove", post(remove_member))
}

fn parse_role(raw: &str) -> Result<TeamRole, AppError> {
    raw.parse::<TeamRole>().map_err(AppError::BadRequest)
}

fn parse_membership_id(raw: &str) -> Result<MembershipId, AppError> {
    MembershipId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn find_team(repo: &TeamRepository<'_>, slug: &str) -> Result<Team, AppError> {
    repo.get_team_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("team {slug}")))
}

/// Fail unless `membership_id` is a membership of `team`.
async fn ensure_member_of(
    repo: &TeamRepository<'_>,
    team: &Team,
    membership_id: MembershipId,
) -> Result<(), AppError> {
    let members = repo.list_members(team.id).await?;
    if members.iter().any(|m| m.membership_id == membership_id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("membership {membership_id} in team {}", team.slug)))
    }
}

/// The acting admin's context, with the current team they had selected.
async fn acting_context<'a>(
    state: &'a AppState,
    session: &Session,
    admin: &CurrentAdmin,
) -> RequestContext<'a> {
    let mut ctx = state.admin_context(session.clone());
    if ctx.restore_session().await
        && let Some(team_id) = admin.current_team
    {
        ctx.set_current_team(team_id);
    }
    ctx
}

/// Re-read the acting admin's teams and store the resulting current team.
async fn refresh_current_team<S, I, M>(
    ctx: &mut AdminContext<S, I, M>,
    session: &Session,
) -> Result<(), AppError>
where
    S: SessionStore,
    I: IdentityStore,
    M: MembershipStore,
{
    ctx.refresh_teams().await;
    match ctx.current_team() {
        Some(membership) => {
            session
                .insert(session_keys::CURRENT_TEAM, membership.team.id)
                .await
                .map_err(SessionStoreError::from)?;
        }
        None => {
            session
                .remove_value(session_keys::CURRENT_TEAM)
                .await
                .map_err(SessionStoreError::from)?;
        }
    }
    Ok(())
}

fn roster_path(slug: &str) -> String {
    format!("/admin/teams/{slug}/members")
}

/// Team roster.
///
/// GET /admin/teams/{team}/members
#[instrument(skip(admin, state))]
async fn members(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, AppError> {
    let repo = TeamRepository::new(state.pool());
    let team = find_team(&repo, &slug).await?;

    let members = repo
        .list_members(team.id)
        .await?
        .into_iter()
        .map(|m| MemberView {
            name: m.name,
            email: m.email,
            membership_id: m.membership_id.to_string(),
            role_options: ROLES
                .iter()
                .map(|role| RoleOption {
                    value: role.as_str(),
                    selected: *role == m.role,
                })
                .collect(),
        })
        .collect();

    let template = TeamMembersTemplate {
        admin_name: admin.identity.user().name.clone(),
        team_name: team.name,
        team_slug: team.slug,
        members,
        roles: ROLES.iter().map(|r| r.as_str()).collect(),
    };

    Ok(Html(template.render()?))
}

/// Add an admin to the team, or change their role if already a member.
///
/// POST /admin/teams/{team}/members
#[instrument(skip(admin, state, session, form))]
async fn add_member(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
    Form(form): Form<AddMemberForm>,
) -> Result<Redirect, AppError> {
    let role = parse_role(&form.role)?;
    let email = Email::parse(&form.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let repo = TeamRepository::new(state.pool());
    let team = find_team(&repo, &slug).await?;
    let member = AdminUserRepository::new(state.pool())
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("admin {email}")))?;

    let mut ctx = acting_context(&state, &session, &admin).await;
    ctx.membership_registry()
        .add_membership(member.id, team.id, role)
        .await?;
    refresh_current_team(&mut ctx, &session).await?;

    info!(
        actor = %admin.identity.user().id,
        member = %member.id,
        team = %team.slug,
        role = %role,
        "Team membership added"
    );
    Ok(Redirect::to(&roster_path(&slug)))
}

/// Change a member's in-team role.
///
/// POST /admin/teams/{team}/members/{id}/role
#[instrument(skip(admin, state, session, form))]
async fn update_role(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((slug, id)): Path<(String, String)>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect, AppError> {
    let role = parse_role(&form.role)?;
    let membership_id = parse_membership_id(&id)?;

    let repo = TeamRepository::new(state.pool());
    let team = find_team(&repo, &slug).await?;
    ensure_member_of(&repo, &team, membership_id).await?;

    let mut ctx = acting_context(&state, &session, &admin).await;
    ctx.membership_registry().update_role(membership_id, role).await?;
    refresh_current_team(&mut ctx, &session).await?;

    info!(
        actor = %admin.identity.user().id,
        membership = %membership_id,
        team = %team.slug,
        role = %role,
        "Team role changed"
    );
    Ok(Redirect::to(&roster_path(&slug)))
}

/// Remove a member from the team.
///
/// POST /admin/teams/{team}/members/{id}/remove
#[instrument(skip(admin, state, session))]
async fn remove_member(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let membership_id = parse_membership_id(&id)?;

    let repo = TeamRepository::new(state.pool());
    let team = find_team(&repo, &slug).await?;
    ensure_member_of(&repo, &team, membership_id).await?;

    let mut ctx = acting_context(&state, &session, &admin).await;
    ctx.membership_registry().remove_membership(membership_id).await?;
    refresh_current_team(&mut ctx, &session).await?;

    info!(
        actor = %admin.identity.user().id,
        membership = %membership_id,
        team = %team.slug,
        "Team membership removed"
    );
    Ok(Redirect::to(&roster_path(&slug)))
}
