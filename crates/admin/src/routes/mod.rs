//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /status                                   - Public site status (JSON)
//!
//! # Auth (email + password, delegated to the identity store)
//! GET  /auth/login                               - Login page
//! POST /auth/login                               - Sign in
//! POST /auth/logout                              - Sign out
//!
//! # Guarded (every request passes the page guard first)
//! GET  /admin                                    - Dashboard
//! POST /admin/current-team                       - Switch current team
//! GET  /admin/teams/{team}/members               - Team roster
//! POST /admin/teams/{team}/members               - Add member
//! POST /admin/teams/{team}/members/{id}/role     - Change member role
//! POST /admin/teams/{team}/members/{id}/remove   - Remove member
//! GET  /admin/settings                           - Settings
//! POST /admin/settings/site-status               - Update site status
//! GET  /admin/users                              - Admin users
//! GET  /admin/{*rest}                            - Content pages
//! ```

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::require_page_access;
use crate::state::AppState;

pub mod admin_users;
pub mod auth;
pub mod dashboard;
pub mod pages;
pub mod settings;
pub mod status;
pub mod teams;

/// Build the application router.
///
/// The `/admin` router is wrapped in the page guard; the auth and status
/// routes are public.
pub fn routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/admin", get(dashboard::index))
        .route("/admin/current-team", post(dashboard::select_team))
        .route("/admin/users", get(admin_users::index))
        .merge(settings::router())
        .merge(teams::router())
        .route("/admin/{*rest}", get(pages::show))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_page_access,
        ));

    Router::new()
        .merge(auth::router())
        .route("/status", get(status::show))
        .merge(admin)
}
