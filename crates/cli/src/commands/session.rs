//! Local admin session.
//!
//! These commands drive the same [`AdminContext`] the admin panel uses, with
//! the session slot kept in a file instead of a cookie.
//!
//! ```bash
//! chapter-cli login -e lead@chapter.edu -p '...'
//! chapter-cli can /admin/finances
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;

use chapter_admin::db::{AdminUserRepository, TeamRepository};
use chapter_admin::services::{AdminContext, FileSessionStore, PermissionPolicy, SessionStore};

use super::{CommandError, connect};

type CliContext<'a> = AdminContext<FileSessionStore, AdminUserRepository<'a>, TeamRepository<'a>>;

/// Where the local session slot lives.
fn session_file() -> Result<PathBuf, CommandError> {
    if let Ok(path) = std::env::var("CHAPTER_SESSION_FILE") {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var("HOME").map_err(|_| CommandError::MissingEnvVar("HOME"))?;
    Ok(PathBuf::from(home).join(".config/chapter/session.json"))
}

fn load_policy() -> Result<PermissionPolicy, CommandError> {
    let policy = match std::env::var("ADMIN_PERMISSIONS_FILE") {
        Ok(path) => PermissionPolicy::load(Path::new(&path))?,
        Err(_) => PermissionPolicy::builtin()?,
    };
    Ok(policy)
}

fn context(pool: &PgPool) -> Result<CliContext<'_>, CommandError> {
    Ok(AdminContext::new(
        FileSessionStore::new(session_file()?),
        AdminUserRepository::new(pool),
        TeamRepository::new(pool),
        Arc::new(load_policy()?),
    ))
}

/// Restore the local session or fail.
async fn restored(pool: &PgPool) -> Result<CliContext<'_>, CommandError> {
    let mut ctx = context(pool)?;
    if ctx.restore_session().await {
        Ok(ctx)
    } else {
        Err(CommandError::NotSignedIn)
    }
}

/// Sign in and store the session slot.
pub async fn login(email: &str, password: String) -> Result<(), CommandError> {
    let pool = connect().await?;
    let mut ctx = context(&pool)?;

    ctx.login(email, &SecretString::from(password)).await?;

    if let Some(admin) = ctx.current_admin() {
        tracing::info!("Signed in as {} <{}>", admin.name, admin.email);
    }
    Ok(())
}

/// Clear the session slot. Succeeds when already signed out.
///
/// Needs no database connection.
pub async fn logout() -> Result<(), CommandError> {
    sign_out(&FileSessionStore::new(session_file()?)).await?;

    tracing::info!("Signed out");
    Ok(())
}

async fn sign_out(store: &FileSessionStore) -> Result<(), CommandError> {
    store.clear().await?;
    Ok(())
}

/// Show the signed-in admin and their teams.
pub async fn whoami() -> Result<(), CommandError> {
    let pool = connect().await?;
    let ctx = restored(&pool).await?;
    let Some(admin) = ctx.current_admin() else {
        return Err(CommandError::NotSignedIn);
    };

    #[allow(clippy::print_stdout)]
    {
        println!("{} <{}> ({})", admin.name, admin.email, admin.role);
        let current = ctx.current_team().map(|m| m.team.id);
        for membership in ctx.user_teams() {
            let marker = if current == Some(membership.team.id) { "*" } else { " " };
            println!("{marker} {:<24} {}", membership.team.slug, membership.role);
        }
    }
    Ok(())
}

/// Check whether the signed-in admin may open `path`.
///
/// Exits non-zero when access would be denied.
pub async fn can(path: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let mut ctx = restored(&pool).await?;

    let allowed = ctx.can_access_page(path).await;

    #[allow(clippy::print_stdout)]
    {
        println!("{path}: {}", if allowed { "allowed" } else { "denied" });
    }

    if allowed {
        Ok(())
    } else {
        std::process::exit(2);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use chapter_admin::models::{AdminUser, StoredSession};
    use chapter_core::{AdminRole, AdminUserId, Email};

    use super::*;

    fn stored() -> StoredSession {
        let now = Utc::now();
        let admin = AdminUser {
            id: AdminUserId::generate(),
            email: Email::parse("lead@chapter.edu").unwrap(),
            name: "Lead".to_string(),
            role: AdminRole::TeamMember,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        StoredSession::issue(&admin, now)
    }

    #[tokio::test]
    async fn test_sign_out_removes_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&stored()).await.unwrap();
        assert!(store.path().exists());

        sign_out(&store).await.unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_out_without_session_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("missing").join("session.json"));

        sign_out(&store).await.unwrap();
    }
}
