//! Page access through the built-in route table.

#![allow(clippy::unwrap_used)]

use chapter_core::{AdminRole, TeamRole};
use chapter_integration_tests::Chapter;

#[tokio::test]
async fn test_admin_denied_security_policy_but_allowed_events() {
    let chapter = Chapter::new();
    let admin = chapter.admin("vp@chapter.edu", AdminRole::Admin);
    let (mut ctx, _slot) = chapter.signed_in(&admin).await;

    assert!(!ctx.can_access_page("/admin/security-policy").await);
    assert!(ctx.can_access_page("/admin/events").await);
}

#[tokio::test]
async fn test_encoded_paths_resolve_like_plain_ones() {
    let chapter = Chapter::new();
    let admin = chapter.admin("vp@chapter.edu", AdminRole::Admin);
    let (mut ctx, _slot) = chapter.signed_in(&admin).await;

    assert!(!ctx.can_access_page("/admin/security%2Dpolicy").await);
    assert!(!ctx.can_access_page("/admin/security%2dpolicy/").await);
    assert!(!ctx.can_access_page("/%61dmin/users").await);
    assert!(!ctx.can_access_page("/admin/%2E%2E/admin/users").await);
    assert!(!ctx.can_access_page("/admin/security%2Fpolicy").await);
    assert!(ctx.can_access_page("/admin/ev%65nts").await);

    let writer = chapter.admin("writer@chapter.edu", AdminRole::TeamMember);
    chapter.join(&writer, &chapter.marketing, TeamRole::Member).await;
    let (mut ctx, _slot) = chapter.signed_in(&writer).await;

    assert!(ctx.can_access_page("/admin/bl%6Fg").await);
    assert!(!ctx.can_access_page("/admin/fin%61nces").await);
}

#[tokio::test]
async fn test_super_admin_reaches_security_policy() {
    let chapter = Chapter::new();
    let root = chapter.admin("president@chapter.edu", AdminRole::SuperAdmin);
    let (mut ctx, _slot) = chapter.signed_in(&root).await;

    assert!(ctx.can_access_page("/admin/security-policy").await);
    assert!(ctx.can_access_page("/admin/users").await);
}

#[tokio::test]
async fn test_team_member_sees_only_their_teams_pages() {
    let chapter = Chapter::new();
    let writer = chapter.admin("writer@chapter.edu", AdminRole::TeamMember);
    chapter.join(&writer, &chapter.marketing, TeamRole::Member).await;
    let (mut ctx, _slot) = chapter.signed_in(&writer).await;

    assert!(ctx.can_access_page("/admin").await);
    assert!(ctx.can_access_page("/admin/tasks").await);
    assert!(ctx.can_access_page("/admin/blog").await);
    assert!(ctx.can_access_page("/admin/blog/new").await);
    assert!(ctx.can_access_page("/admin/blog/42/edit").await);

    // Member ceiling is edit; sending a newsletter needs manage.
    assert!(!ctx.can_access_page("/admin/newsletter/send").await);
    assert!(!ctx.can_access_page("/admin/finances").await);
    assert!(!ctx.can_access_page("/admin/settings").await);
}

#[tokio::test]
async fn test_team_pages_bind_the_named_team() {
    let chapter = Chapter::new();
    let lead = chapter.admin("events-lead@chapter.edu", AdminRole::TeamMember);
    chapter.join(&lead, &chapter.events, TeamRole::Lead).await;
    let (mut ctx, _slot) = chapter.signed_in(&lead).await;

    assert!(ctx.can_access_page("/admin/teams/events/members").await);
    assert!(!ctx.can_access_page("/admin/teams/finance/members").await);
}

#[tokio::test]
async fn test_membership_change_applies_to_next_check() {
    let chapter = Chapter::new();
    let volunteer = chapter.admin("volunteer@chapter.edu", AdminRole::TeamMember);
    let (mut ctx, _slot) = chapter.signed_in(&volunteer).await;

    assert!(!ctx.can_access_page("/admin/events").await);

    chapter.join(&volunteer, &chapter.events, TeamRole::Member).await;
    assert!(ctx.can_access_page("/admin/events").await);
}

#[tokio::test]
async fn test_dot_segments_are_denied() {
    let chapter = Chapter::new();
    let root = chapter.admin("president@chapter.edu", AdminRole::SuperAdmin);
    let (mut ctx, _slot) = chapter.signed_in(&root).await;

    assert!(!ctx.can_access_page("/admin/events/../security-policy").await);
}

#[tokio::test]
async fn test_signed_out_context_is_denied_admin_pages() {
    let chapter = Chapter::new();
    let mut ctx = chapter.context(&chapter_admin::services::MemorySessionStore::new());

    assert!(!ctx.restore_session().await);
    assert!(!ctx.can_access_page("/admin").await);
    assert!(ctx.can_access_page("/").await);
}
