//! A permission check that resolves after the viewer navigated away must not
//! decide what the new page shows.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, oneshot};

use chapter_admin::middleware::{GuardState, PageGuard, check};
use chapter_core::{AdminRole, TeamRole};
use chapter_integration_tests::Chapter;

#[tokio::test]
async fn test_stale_allow_does_not_override_newer_denial() {
    let guard = Mutex::new(PageGuard::new());
    let (release_first, first_result) = oneshot::channel::<bool>();

    // The finances check is slow and would allow.
    let first = check(&guard, "/admin/finances", true, |_| async move {
        Ok::<_, String>(first_result.await.unwrap_or(false))
    });

    // Navigation to /admin/team resolves first, denied.
    let second = async {
        let state = check(&guard, "/admin/team", true, |_| async { Ok::<_, String>(false) }).await;
        release_first.send(true).unwrap();
        state
    };

    let (first_state, second_state) = tokio::join!(first, second);

    assert_eq!(second_state, GuardState::Denied);
    assert_eq!(first_state, GuardState::Denied);

    let guard = guard.lock().await;
    assert_eq!(guard.path(), Some("/admin/team"));
    assert_eq!(guard.state(), GuardState::Denied);
}

#[tokio::test]
async fn test_stale_denial_does_not_override_newer_allow() {
    let guard = Mutex::new(PageGuard::new());
    let (release_first, first_result) = oneshot::channel::<bool>();

    let first = check(&guard, "/admin/finances", true, |_| async move {
        Ok::<_, String>(first_result.await.unwrap_or(false))
    });
    let second = async {
        let state = check(&guard, "/admin/team", true, |_| async { Ok::<_, String>(true) }).await;
        release_first.send(false).unwrap();
        state
    };

    let (first_state, second_state) = tokio::join!(first, second);

    assert_eq!(second_state, GuardState::Allowed);
    assert_eq!(first_state, GuardState::Allowed);
    assert_eq!(guard.lock().await.state(), GuardState::Allowed);
}

#[tokio::test]
async fn test_unauthenticated_redirects_without_evaluating() {
    let guard = Mutex::new(PageGuard::new());
    let calls = AtomicUsize::new(0);

    let state = check(&guard, "/admin/events", false, |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, String>(true) }
    })
    .await;

    assert_eq!(state, GuardState::RedirectToLogin);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_outage_during_check_denies() {
    let chapter = Chapter::new();
    let lead = chapter.admin("finance-lead@chapter.edu", AdminRole::TeamMember);
    chapter.join(&lead, &chapter.finance, TeamRole::Lead).await;
    let (mut ctx, _slot) = chapter.signed_in(&lead).await;

    let guard = Mutex::new(PageGuard::new());
    let ctx_ref = &mut ctx;
    let allowed = check(&guard, "/admin/finances", true, |path| async move {
        ctx_ref.check_page_access(&path).await
    })
    .await;
    assert_eq!(allowed, GuardState::Allowed);

    chapter.directory.set_offline(true);

    let ctx_ref = &mut ctx;
    let during_outage = check(&guard, "/admin/finances", true, |path| async move {
        ctx_ref.check_page_access(&path).await
    })
    .await;
    assert_eq!(during_outage, GuardState::Denied);
}
