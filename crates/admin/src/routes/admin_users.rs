//! Admin users management route handler.

use askama::Template;
use axum::extract::State;
use axum::response::Html;
use tracing::instrument;

use crate::{
    db::AdminUserRepository, error::AppError, middleware::RequireAdminAuth, models::AdminUser,
    state::AppState,
};

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserListItem {
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub is_active: bool,
    pub last_login: String,
}

impl From<&AdminUser> for AdminUserListItem {
    fn from(user: &AdminUser) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            role: user.role.as_str(),
            is_active: user.is_active,
            last_login: user
                .last_login_at
                .map_or_else(|| "never".to_string(), |at| at.format("%Y-%m-%d %H:%M UTC").to_string()),
        }
    }
}

/// Admin users page template.
#[derive(Template)]
#[template(path = "admin/admin_users.html")]
pub struct AdminUsersTemplate {
    pub admin_name: String,
    pub users: Vec<AdminUserListItem>,
}

/// List every admin account.
///
/// GET /admin/users
#[instrument(skip_all)]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let users = AdminUserRepository::new(state.pool()).list_all().await?;

    let template = AdminUsersTemplate {
        admin_name: admin.identity.user().name.clone(),
        users: users.iter().map(AdminUserListItem::from).collect(),
    };

    Ok(Html(template.render()?))
}
