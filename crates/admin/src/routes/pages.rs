//! Content pages behind the guard.
//!
//! The content editors live outside this crate; each page here renders its
//! heading and the permission it requires so guarded navigation can be
//! exercised end to end.

use askama::Template;
use axum::{extract::State, http::Uri, response::Html};

use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::services::permissions;
use crate::state::AppState;

/// Generic content page template.
#[derive(Template)]
#[template(path = "admin/page.html")]
pub struct PageTemplate {
    pub admin_name: String,
    pub title: String,
    pub path: String,
    pub requirement: Option<String>,
}

/// Title for a path: the declared route title, else the last literal segment.
fn page_title(state: &AppState, path: &str) -> String {
    if let Some(title) = state
        .policy()
        .routes()
        .iter()
        .find(|route| route.pattern() == path)
        .and_then(|route| route.title())
    {
        return title.to_string();
    }

    let last = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("admin");
    let mut chars = last.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>().replace('-', " ")
    })
}

/// Render a content page.
///
/// Renders the same decoded path the guard evaluated.
///
/// GET /admin/{*rest}
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    let path = permissions::canonical_path(uri.path())
        .ok_or_else(|| AppError::NotFound(uri.path().to_string()))?;
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let requirement = state
        .policy()
        .resolve(&segments)
        .map(|m| match m.team {
            Some(team) => format!("{} {} on team {team}", m.action, m.resource),
            None => format!("{} {}", m.action, m.resource),
        });

    let template = PageTemplate {
        admin_name: admin.identity.user().name.clone(),
        title: page_title(&state, &path),
        path,
        requirement,
    };

    Ok(Html(template.render()?))
}
