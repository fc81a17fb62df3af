//! Login, restore, expiry and logout through the identity provider.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use secrecy::SecretString;

use chapter_admin::models::StoredSession;
use chapter_admin::services::{AdminAuthError, MemorySessionStore};
use chapter_core::{AdminRole, TeamRole};
use chapter_integration_tests::{Chapter, password};

fn team_ids(ctx: &chapter_integration_tests::TestContext) -> Vec<String> {
    let mut ids: Vec<String> = ctx.user_teams().iter().map(|m| m.team.id.to_string()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_login_then_reload_restores_same_admin_and_teams() {
    let chapter = Chapter::new();
    let lead = chapter.admin("events-lead@chapter.edu", AdminRole::TeamMember);
    chapter.join(&lead, &chapter.events, TeamRole::Lead).await;
    chapter.join(&lead, &chapter.marketing, TeamRole::Member).await;

    let (before, slot) = chapter.signed_in(&lead).await;
    assert!(before.is_authenticated());

    // A reload builds a new context over the same slot.
    let mut after = chapter.context(&slot);
    assert!(after.restore_session().await);

    assert_eq!(after.current_admin().unwrap().id, before.current_admin().unwrap().id);
    assert_eq!(team_ids(&after), team_ids(&before));
    assert_eq!(team_ids(&after).len(), 2);
}

#[tokio::test]
async fn test_slot_has_documented_shape() {
    let chapter = Chapter::new();
    let admin = chapter.admin("vp@chapter.edu", AdminRole::Admin);
    let (_ctx, slot) = chapter.signed_in(&admin).await;

    let raw: serde_json::Value = serde_json::from_str(&slot.raw().unwrap()).unwrap();
    assert_eq!(raw["authenticated"], true);
    assert_eq!(raw["adminId"], admin.id.to_string());
    assert_eq!(raw["email"], "vp@chapter.edu");
    assert!(raw["expires"].as_i64().unwrap() > Utc::now().timestamp_millis());
}

#[tokio::test]
async fn test_expired_session_is_cleared_on_restore() {
    let chapter = Chapter::new();
    let admin = chapter.admin("vp@chapter.edu", AdminRole::Admin);

    let expired = StoredSession::issue(&admin, Utc::now() - Duration::days(2));
    assert!(expired.is_expired(Utc::now()));
    let slot = MemorySessionStore::with_raw(serde_json::to_string(&expired).unwrap());

    let mut ctx = chapter.context(&slot);
    assert!(!ctx.restore_session().await);
    assert!(!ctx.is_authenticated());
    assert!(ctx.current_admin().is_none());
    assert!(slot.raw().is_none(), "expired slot must be removed");
}

#[tokio::test]
async fn test_deactivated_admin_is_signed_out_on_reload() {
    let chapter = Chapter::new();
    let admin = chapter.admin("alum@chapter.edu", AdminRole::Admin);
    let (_ctx, slot) = chapter.signed_in(&admin).await;

    assert!(chapter.directory.set_active(admin.id, false));

    let mut ctx = chapter.context(&slot);
    assert!(!ctx.restore_session().await);
    assert!(slot.raw().is_none());
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
    let chapter = Chapter::new();
    let admin = chapter.admin("vp@chapter.edu", AdminRole::Admin);
    let mut ctx = chapter.context(&MemorySessionStore::new());

    let wrong = ctx
        .login(admin.email.as_str(), &SecretString::from("hunter2"))
        .await
        .unwrap_err();
    let unknown = ctx
        .login("nobody@chapter.edu", &password())
        .await
        .unwrap_err();

    assert!(matches!(wrong, AdminAuthError::InvalidCredentials));
    assert!(matches!(unknown, AdminAuthError::InvalidCredentials));
    assert_eq!(wrong.to_string(), unknown.to_string());
    assert!(!ctx.is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_slot_and_state() {
    let chapter = Chapter::new();
    let lead = chapter.admin("events-lead@chapter.edu", AdminRole::TeamMember);
    chapter.join(&lead, &chapter.events, TeamRole::Lead).await;

    let (mut ctx, slot) = chapter.signed_in(&lead).await;
    assert!(ctx.current_team().is_some());

    ctx.logout().await;
    assert!(!ctx.is_authenticated());
    assert!(ctx.user_teams().is_empty());
    assert!(ctx.current_team().is_none());
    assert!(slot.raw().is_none());

    // Idempotent.
    ctx.logout().await;
    assert!(!ctx.is_authenticated());
}
