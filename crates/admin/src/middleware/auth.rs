//! Authentication extractors for admin.
//!
//! The page guard attaches the [`CurrentAdmin`] to every request it allows.
//! Handlers behind the guard take it with [`RequireAdminAuth`].

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::models::CurrentAdmin;

/// Extractor that requires an admin admitted by the page guard.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.identity.user().name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Rejection when no admin is attached to the request.
#[derive(Debug)]
pub struct AdminAuthRejection;

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        Redirect::to("/auth/login").into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .map(Self)
            .ok_or(AdminAuthRejection)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::get,
    };
    use chrono::Utc;
    use tower::ServiceExt;

    use chapter_core::{AdminRole, AdminUserId, Email};

    use super::*;
    use crate::models::{AdminIdentity, AdminUser};

    async fn whoami(RequireAdminAuth(admin): RequireAdminAuth) -> String {
        admin.identity.user().name.clone()
    }

    fn request() -> Request<Body> {
        Request::builder().uri("/admin").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_admin_redirects_to_login() {
        let app = Router::new().route("/admin", get(whoami));

        let response = app.oneshot(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/auth/login");
    }

    #[tokio::test]
    async fn test_admitted_admin_is_extracted() {
        let user = AdminUser {
            id: AdminUserId::generate(),
            email: Email::parse("secretary@chapter.edu").unwrap(),
            name: "Secretary".to_string(),
            role: AdminRole::Admin,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let current = CurrentAdmin {
            identity: AdminIdentity::new(user, &[]),
            teams: Vec::new(),
            current_team: None,
        };
        let app = Router::new()
            .route("/admin", get(whoami))
            .layer(Extension(current));

        let response = app.oneshot(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
