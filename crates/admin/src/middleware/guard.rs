//! Page access guard.
//!
//! [`PageGuard`] is the state machine deciding what a protected page may
//! show. Every path change starts a new check and bumps the generation; a
//! check result is applied only if its ticket still names the current
//! generation and path, so a slow check for a page the viewer already left
//! can never decide what the new page shows.
//!
//! ```text
//! begin(path, authenticated = false) -> RedirectToLogin
//! begin(path, authenticated = true)  -> Checking -> { Allowed, Denied }
//! ```
//!
//! [`require_page_access`] applies the guard to every `/admin` request.

use std::fmt::Display;
use std::future::Future;

use askama::Template;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use tokio::sync::Mutex;
use tower_sessions::Session;
use tracing::{debug, error};

use chapter_core::TeamId;

use crate::error::set_sentry_user;
use crate::models::session_keys;
use crate::services::auth::{AdminContext, IdentityStore, MembershipStore};
use crate::services::session_store::SessionStore;
use crate::state::AppState;

/// What a guarded page may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Decision pending. Nothing from the page is shown.
    Checking,
    Allowed,
    /// Authenticated but not permitted. Shows the access-denied view.
    Denied,
    /// Not authenticated. Redirects without checking.
    RedirectToLogin,
}

/// Identifies one in-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    path: String,
    generation: u64,
}

impl CheckTicket {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Result of starting a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardStep {
    Redirect,
    Check(CheckTicket),
}

/// Guard state for one view.
#[derive(Debug)]
pub struct PageGuard {
    path: Option<String>,
    generation: u64,
    state: GuardState,
}

impl Default for PageGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl PageGuard {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            path: None,
            generation: 0,
            state: GuardState::Checking,
        }
    }

    #[must_use]
    pub const fn state(&self) -> GuardState {
        self.state
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Start evaluating `path`. Any check still in flight becomes stale.
    pub fn begin(&mut self, path: &str, authenticated: bool) -> GuardStep {
        self.generation += 1;
        self.path = Some(path.to_string());

        if !authenticated {
            self.state = GuardState::RedirectToLogin;
            return GuardStep::Redirect;
        }

        self.state = GuardState::Checking;
        GuardStep::Check(CheckTicket {
            path: path.to_string(),
            generation: self.generation,
        })
    }

    /// Apply a check result. Returns false if the ticket is stale.
    ///
    /// An evaluation error denies.
    pub fn complete<E: Display>(&mut self, ticket: &CheckTicket, outcome: Result<bool, E>) -> bool {
        if ticket.generation != self.generation || self.path.as_deref() != Some(ticket.path.as_str()) {
            debug!(path = %ticket.path, "Discarding stale permission check");
            return false;
        }

        self.state = match outcome {
            Ok(true) => GuardState::Allowed,
            Ok(false) => GuardState::Denied,
            Err(e) => {
                error!(path = %ticket.path, error = %e, "Permission check failed");
                GuardState::Denied
            }
        };
        true
    }
}

/// Run one guarded check for `path`.
///
/// `evaluate` receives the path the check was issued for. The returned state
/// is the guard's state after this check, which belongs to a newer path if
/// the path changed while `evaluate` was running.
pub async fn check<F, Fut, E>(
    guard: &Mutex<PageGuard>,
    path: &str,
    authenticated: bool,
    evaluate: F,
) -> GuardState
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    let step = guard.lock().await.begin(path, authenticated);
    let ticket = match step {
        GuardStep::Redirect => return GuardState::RedirectToLogin,
        GuardStep::Check(ticket) => ticket,
    };

    let outcome = evaluate(ticket.path.clone()).await;

    let mut guard = guard.lock().await;
    guard.complete(&ticket, outcome);
    guard.state()
}

// =============================================================================
// HTTP middleware
// =============================================================================

/// Access-denied page.
#[derive(Template)]
#[template(path = "admin/denied.html")]
struct DeniedTemplate {
    path: String,
}

fn denied_response(path: String) -> Response {
    let body = DeniedTemplate { path }
        .render()
        .unwrap_or_else(|_| "You do not have access to this page.".to_string());
    (StatusCode::FORBIDDEN, Html(body)).into_response()
}

/// Guard every `/admin` request.
///
/// Builds the request's [`AdminContext`] from the cookie session and hands
/// off to [`guard_request`].
pub async fn require_page_access(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let preferred_team = session
        .get::<TeamId>(session_keys::CURRENT_TEAM)
        .await
        .ok()
        .flatten();
    let ctx = state.admin_context(session);
    guard_request(ctx, preferred_team, request, next).await
}

/// Apply the guard to one request with an already constructed context.
///
/// Unauthenticated requests are redirected to the login page; denied requests
/// get a 403 with the access-denied page. Allowed requests carry the
/// [`crate::models::CurrentAdmin`] in their extensions. `preferred_team`
/// becomes the current team if the admin still belongs to it.
pub async fn guard_request<S, I, M>(
    mut ctx: AdminContext<S, I, M>,
    preferred_team: Option<TeamId>,
    mut request: Request,
    next: Next,
) -> Response
where
    S: SessionStore,
    I: IdentityStore,
    M: MembershipStore,
{
    let path = request.uri().path().to_string();

    let authenticated = ctx.restore_session().await;
    if authenticated && let Some(team_id) = preferred_team {
        ctx.set_current_team(team_id);
    }

    let guard = Mutex::new(PageGuard::new());
    let ctx_ref = &mut ctx;
    let decision = check(&guard, &path, authenticated, |path| async move {
        ctx_ref.check_page_access(&path).await
    })
    .await;

    match decision {
        GuardState::RedirectToLogin => Redirect::to("/auth/login").into_response(),
        GuardState::Allowed => {
            let Some(current) = ctx.current() else {
                return Redirect::to("/auth/login").into_response();
            };
            let user = current.identity.user();
            set_sentry_user(&user.id.to_string(), Some(user.email.as_str()));
            request.extensions_mut().insert(current);
            next.run(request).await
        }
        GuardState::Denied | GuardState::Checking => denied_response(path),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Extension, Router,
        body::{Body, to_bytes},
        http::header,
        middleware::from_fn,
        routing::get,
    };
    use secrecy::SecretString;
    use tower::ServiceExt;

    use chapter_core::{AdminRole, Email, TeamRole};

    use super::*;
    use crate::models::{AdminUser, CurrentAdmin};
    use crate::services::auth::MemoryDirectory;
    use crate::services::permissions::PermissionPolicy;
    use crate::services::session_store::MemorySessionStore;

    const PASSWORD: &str = "correct horse";

    async fn whoami(Extension(current): Extension<CurrentAdmin>) -> String {
        current.identity.user().name.clone()
    }

    /// Router guarding every path with contexts over `slot` and `dir`.
    fn app(slot: &MemorySessionStore, dir: &MemoryDirectory) -> Router {
        let policy = Arc::new(PermissionPolicy::builtin().unwrap());
        let (slot, dir) = (slot.clone(), dir.clone());
        Router::new()
            .route("/admin", get(whoami))
            .route("/admin/{*rest}", get(whoami))
            .layer(from_fn(move |request: Request, next: Next| {
                let ctx = AdminContext::new(slot.clone(), dir.clone(), dir.clone(), Arc::clone(&policy));
                async move { guard_request(ctx, None, request, next).await }
            }))
    }

    async fn sign_in(
        slot: &MemorySessionStore,
        dir: &MemoryDirectory,
        email: &str,
        role: AdminRole,
    ) -> AdminUser {
        let admin = dir.add_admin(Email::parse(email).unwrap(), "Guarded Admin", role, PASSWORD);
        let policy = Arc::new(PermissionPolicy::builtin().unwrap());
        let mut ctx = AdminContext::new(slot.clone(), dir.clone(), dir.clone(), policy);
        ctx.login(email, &SecretString::from(PASSWORD)).await.unwrap();
        admin
    }

    async fn get_path(app: Router, path: &str) -> (StatusCode, Option<String>, String) {
        let request = axum::http::Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, location, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_unauthenticated_redirects_without_checking() {
        let mut guard = PageGuard::new();
        assert_eq!(guard.begin("/admin/events", false), GuardStep::Redirect);
        assert_eq!(guard.state(), GuardState::RedirectToLogin);
    }

    #[test]
    fn test_starts_checking_and_resolves() {
        let mut guard = PageGuard::new();
        let GuardStep::Check(ticket) = guard.begin("/admin/events", true) else {
            panic!("expected a check");
        };
        assert_eq!(guard.state(), GuardState::Checking);

        assert!(guard.complete::<String>(&ticket, Ok(true)));
        assert_eq!(guard.state(), GuardState::Allowed);
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut guard = PageGuard::new();
        let GuardStep::Check(first) = guard.begin("/admin/finances", true) else {
            panic!("expected a check");
        };
        let GuardStep::Check(second) = guard.begin("/admin/team", true) else {
            panic!("expected a check");
        };

        assert!(!guard.complete::<String>(&first, Ok(true)));
        assert_eq!(guard.state(), GuardState::Checking);

        assert!(guard.complete::<String>(&second, Ok(false)));
        assert_eq!(guard.state(), GuardState::Denied);
    }

    #[test]
    fn test_revisiting_same_path_still_discards_old_ticket() {
        let mut guard = PageGuard::new();
        let GuardStep::Check(old) = guard.begin("/admin/events", true) else {
            panic!("expected a check");
        };
        let _ = guard.begin("/admin/events", true);

        assert!(!guard.complete::<String>(&old, Ok(true)));
        assert_eq!(guard.state(), GuardState::Checking);
    }

    #[test]
    fn test_error_denies() {
        let mut guard = PageGuard::new();
        let GuardStep::Check(ticket) = guard.begin("/admin/finances", true) else {
            panic!("expected a check");
        };
        assert!(guard.complete(&ticket, Err("store unavailable")));
        assert_eq!(guard.state(), GuardState::Denied);
    }

    #[tokio::test]
    async fn test_check_passes_issued_path() {
        let guard = Mutex::new(PageGuard::new());
        let state = check(&guard, "/admin/blog", true, |path| async move {
            Ok::<_, String>(path == "/admin/blog")
        })
        .await;
        assert_eq!(state, GuardState::Allowed);
    }

    #[tokio::test]
    async fn test_request_without_session_redirects_to_login() {
        let (slot, dir) = (MemorySessionStore::new(), MemoryDirectory::new());

        let (status, location, _) = get_path(app(&slot, &dir), "/admin/events").await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/auth/login"));
    }

    #[tokio::test]
    async fn test_denied_request_gets_403_with_dashboard_link() {
        let (slot, dir) = (MemorySessionStore::new(), MemoryDirectory::new());
        sign_in(&slot, &dir, "member@chapter.edu", AdminRole::TeamMember).await;

        let (status, _, body) = get_path(app(&slot, &dir), "/admin/finances").await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("/admin/finances"));
        assert!(body.contains(r#"href="/admin""#));
        assert!(!body.contains("Guarded Admin"));
    }

    #[tokio::test]
    async fn test_allowed_request_carries_current_admin() {
        let (slot, dir) = (MemorySessionStore::new(), MemoryDirectory::new());
        let admin = sign_in(&slot, &dir, "finance@chapter.edu", AdminRole::TeamMember).await;
        let finance = dir.add_team("Finance", "finance", "#16a34a");
        dir.add_membership(admin.id, finance.id, TeamRole::Member)
            .await
            .unwrap();

        let (status, _, body) = get_path(app(&slot, &dir), "/admin/finances").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Guarded Admin");
    }

    #[tokio::test]
    async fn test_encoded_super_admin_page_is_denied_to_admin() {
        let (slot, dir) = (MemorySessionStore::new(), MemoryDirectory::new());
        sign_in(&slot, &dir, "secretary@chapter.edu", AdminRole::Admin).await;
        let app = app(&slot, &dir);

        let (plain, _, _) = get_path(app.clone(), "/admin/security-policy").await;
        let (encoded, _, body) = get_path(app.clone(), "/admin/security%2Dpolicy").await;
        let (unlisted, _, _) = get_path(app, "/admin/unlisted-page").await;

        assert_eq!(plain, StatusCode::FORBIDDEN);
        assert_eq!(encoded, StatusCode::FORBIDDEN);
        assert!(!body.contains("Guarded Admin"));
        assert_eq!(unlisted, StatusCode::OK);
    }
}
