//! Authentication route handlers for admin.
//!
//! Credentials are checked by the identity store; this module only moves the
//! outcome in and out of the session.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, warn};

use crate::error::{AppError, clear_sentry_user};
use crate::models::session_keys;
use crate::services::{AdminAuthError, SessionStoreError};
use crate::state::AppState;

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    error: Option<String>,
    email: String,
}

/// Login form fields.
#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", axum::routing::post(logout))
}

/// Render the login page, or skip it when a session is already live.
///
/// GET /auth/login
async fn login_page(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let mut ctx = state.admin_context(session);
    if ctx.restore_session().await {
        return Ok(Redirect::to("/admin").into_response());
    }

    let body = LoginTemplate {
        error: None,
        email: String::new(),
    }
    .render()?;
    Ok(Html(body).into_response())
}

/// Sign in.
///
/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut ctx = state.admin_context(session.clone());

    match ctx.login(&form.email, &SecretString::from(form.password)).await {
        Ok(()) => {
            if let Some(team) = ctx.current_team() {
                session
                    .insert(session_keys::CURRENT_TEAM, team.team.id)
                    .await
                    .map_err(SessionStoreError::from)?;
            }
            if let Some(admin) = ctx.current_admin() {
                info!(admin_id = %admin.id, "Admin signed in");
            }
            Ok(Redirect::to("/admin").into_response())
        }
        Err(e) => {
            let status = match &e {
                AdminAuthError::InvalidCredentials => {
                    warn!("Rejected sign-in attempt");
                    StatusCode::UNAUTHORIZED
                }
                AdminAuthError::Store(source) => {
                    error!(error = %source, "Identity store unavailable during sign-in");
                    StatusCode::SERVICE_UNAVAILABLE
                }
                AdminAuthError::Session(source) => {
                    error!(error = %source, "Session slot unavailable during sign-in");
                    StatusCode::SERVICE_UNAVAILABLE
                }
            };

            let body = LoginTemplate {
                error: Some(e.to_string()),
                email: form.email,
            }
            .render()?;
            Ok((status, Html(body)).into_response())
        }
    }
}

/// Forget the selected team. Failures are logged, not raised.
async fn clear_current_team(session: &Session) {
    if let Err(e) = session.remove_value(session_keys::CURRENT_TEAM).await {
        warn!(error = %e, "Failed to clear current team on logout");
    }
}

/// Sign out and clear the session slot.
///
/// POST /auth/logout
async fn logout(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let mut ctx = state.admin_context(session.clone());
    ctx.logout().await;
    clear_current_team(&session).await;
    clear_sentry_user();

    Redirect::to("/auth/login")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use chapter_core::TeamId;

    use super::*;

    #[tokio::test]
    async fn test_clear_current_team_removes_selection() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session
            .insert(session_keys::CURRENT_TEAM, TeamId::generate())
            .await
            .unwrap();

        clear_current_team(&session).await;
        clear_current_team(&session).await;

        let stored: Option<TeamId> = session.get(session_keys::CURRENT_TEAM).await.unwrap();
        assert_eq!(stored, None);
    }
}
