//! Site settings routes.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::services::SiteStatus;
use crate::services::site_status::SITE_STATUS_KEY;
use crate::state::AppState;

/// Settings page template.
#[derive(Template)]
#[template(path = "admin/settings.html")]
pub struct SettingsTemplate {
    pub admin_name: String,
    pub status_label: &'static str,
    pub maintenance: bool,
    pub message: String,
}

/// Site status form fields.
#[derive(Deserialize)]
pub struct SiteStatusForm {
    status: String,
    #[serde(default)]
    message: String,
}

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/settings", get(index))
        .route("/admin/settings/site-status", post(update_site_status))
}

/// Settings page.
///
/// GET /admin/settings
#[instrument(skip_all)]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let status = state.site_status().current().await;

    let (status_label, maintenance, message) = match status {
        SiteStatus::Online => ("Online", false, String::new()),
        SiteStatus::Maintenance { message } => ("Maintenance", true, message.unwrap_or_default()),
        SiteStatus::Unknown => ("Unknown", false, String::new()),
    };

    let template = SettingsTemplate {
        admin_name: admin.identity.user().name.clone(),
        status_label,
        maintenance,
        message,
    };

    Ok(Html(template.render()?))
}

/// Store a new site status and drop the memoized copy.
///
/// POST /admin/settings/site-status
#[instrument(skip(admin, state, form))]
async fn update_site_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Form(form): Form<SiteStatusForm>,
) -> Result<Redirect, AppError> {
    let status = match form.status.as_str() {
        "online" => SiteStatus::Online,
        "maintenance" => {
            let message = form.message.trim();
            SiteStatus::Maintenance {
                message: (!message.is_empty()).then(|| message.to_string()),
            }
        }
        other => return Err(AppError::BadRequest(format!("invalid site status: {other}"))),
    };

    let value = serde_json::to_value(&status).map_err(|e| AppError::Internal(e.to_string()))?;
    state.settings().set_setting(SITE_STATUS_KEY, &value).await?;
    state.site_status().invalidate().await;

    info!(actor = %admin.identity.user().id, status = %form.status, "Site status updated");
    Ok(Redirect::to("/admin/settings"))
}
