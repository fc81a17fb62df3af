//! Dashboard route handlers.

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{debug, instrument};

use chapter_core::TeamId;

use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, Role, session_keys};
use crate::services::{SessionStoreError, permissions};
use crate::state::AppState;

/// Team row on the dashboard.
#[derive(Debug, Clone)]
pub struct TeamView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub color: String,
    pub role: &'static str,
    pub is_current: bool,
}

/// Navigation link to a page the admin may open.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub path: String,
    pub title: String,
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub admin_name: String,
    pub role_label: &'static str,
    pub teams: Vec<TeamView>,
    pub pages: Vec<PageLink>,
}

/// Human label for the effective role.
#[must_use]
pub const fn role_label(role: &Role) -> &'static str {
    match role {
        Role::SuperAdmin => "Super admin",
        Role::Admin => "Admin",
        Role::TeamMember(_) => "Team member",
    }
}

fn team_views(admin: &CurrentAdmin) -> Vec<TeamView> {
    admin
        .teams
        .iter()
        .map(|m| TeamView {
            id: m.team.id.to_string(),
            name: m.team.name.clone(),
            slug: m.team.slug.clone(),
            color: m.team.color.clone(),
            role: m.role.as_str(),
            is_current: admin.current_team == Some(m.team.id),
        })
        .collect()
}

/// Dashboard page.
///
/// Lists the admin's teams and every titled page the admin may open.
#[instrument(skip_all)]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let policy = state.policy();

    let pages = policy
        .routes()
        .iter()
        .filter_map(|route| {
            route.title().map(|title| PageLink {
                path: route.pattern().to_string(),
                title: title.to_string(),
            })
        })
        .filter(|page| permissions::can_access_page(policy, Some(&admin.identity), &page.path))
        .collect();

    let template = DashboardTemplate {
        admin_name: admin.identity.user().name.clone(),
        role_label: role_label(admin.identity.role()),
        teams: team_views(&admin),
        pages,
    };

    Ok(Html(template.render()?))
}

/// Current team form fields.
#[derive(Deserialize)]
pub struct SelectTeamForm {
    team_id: String,
}

/// Switch the current team.
///
/// POST /admin/current-team
#[instrument(skip_all)]
pub async fn select_team(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<SelectTeamForm>,
) -> Result<Redirect, AppError> {
    let team_id = TeamId::parse(&form.team_id).map_err(|e| AppError::BadRequest(e.to_string()))?;

    if !admin.teams.iter().any(|m| m.team.id == team_id) {
        return Err(AppError::Forbidden("not a member of that team".to_string()));
    }

    session
        .insert(session_keys::CURRENT_TEAM, team_id)
        .await
        .map_err(SessionStoreError::from)?;
    debug!(team_id = %team_id, "Current team changed");

    Ok(Redirect::to("/admin"))
}
