//! Public site status.

use axum::{Json, extract::State};

use crate::services::SiteStatus;
use crate::state::AppState;

/// Current site status as JSON.
///
/// GET /status
pub async fn show(State(state): State<AppState>) -> Json<SiteStatus> {
    Json(state.site_status().current().await)
}
