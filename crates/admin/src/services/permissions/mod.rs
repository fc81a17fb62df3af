//! Permission evaluator.
//!
//! Stateless decisions over an [`AdminIdentity`] snapshot. Callers are
//! responsible for handing in a snapshot built from current membership data;
//! nothing here caches a decision.
//!
//! Evaluation by role:
//!
//! - no admin: deny
//! - super admin: allow
//! - admin: allow unless the resource is super-admin-only
//! - team member: allow if a member default covers the action, or if their
//!   membership in the evaluated team has a ceiling at or above the action.
//!   The evaluated team is the page's `{team}` when there is one, otherwise
//!   the resource's owner.

mod policy;

pub use policy::{PermissionPolicy, PolicyError, Route, RouteMatch};

use tracing::info;

use chapter_core::{Action, Resource};

use crate::models::{AdminIdentity, Role, TeamMembership};

/// Check whether `admin` may perform `action` on `resource`.
#[must_use]
pub fn has_permission(
    policy: &PermissionPolicy,
    admin: Option<&AdminIdentity>,
    resource: Resource,
    action: Action,
) -> bool {
    evaluate(policy, admin, resource, action, None)
}

/// Like [`has_permission`], but only a membership in `team_slug` counts.
///
/// Used for team-specific targets, where leading some other team grants
/// nothing.
#[must_use]
pub fn has_team_permission(
    policy: &PermissionPolicy,
    admin: Option<&AdminIdentity>,
    resource: Resource,
    action: Action,
    team_slug: &str,
) -> bool {
    evaluate(policy, admin, resource, action, Some(team_slug))
}

/// Check whether `admin` may open `path`.
///
/// Paths outside `/admin` are always allowed. Unmapped `/admin` paths are
/// allowed for admins and super admins and denied for team members.
/// Segments are percent-decoded before matching, so an encoded spelling of a
/// protected page resolves to the same route as the plain one.
#[must_use]
pub fn can_access_page(policy: &PermissionPolicy, admin: Option<&AdminIdentity>, path: &str) -> bool {
    let Some(segments) = normalize_path(path) else {
        return false;
    };
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    if segments.first() != Some(&"admin") {
        return true;
    }

    let Some(identity) = admin else {
        return false;
    };

    let allowed = match policy.resolve(&segments) {
        Some(hit) => evaluate(policy, admin, hit.resource, hit.action, hit.team),
        None => identity.is_admin(),
    };

    if !allowed {
        info!(
            admin_id = %identity.user().id,
            path,
            "Page access denied"
        );
    }
    allowed
}

/// True if `path` is part of the admin surface.
#[must_use]
pub fn is_admin_path(path: &str) -> bool {
    normalize_path(path).is_none_or(|segments| segments.first().map(String::as_str) == Some("admin"))
}

/// The decoded path [`can_access_page`] evaluates for `path`.
///
/// `None` for paths that are never accessible.
#[must_use]
pub fn canonical_path(path: &str) -> Option<String> {
    normalize_path(path).map(|segments| format!("/{}", segments.join("/")))
}

/// Split a request path into percent-decoded segments.
///
/// Drops the query and fragment, leading/trailing and doubled slashes.
/// Returns `None` if any segment is `.` or `..`, contains `/` once decoded,
/// or does not decode to UTF-8. Callers treat those paths as inaccessible.
fn normalize_path(path: &str) -> Option<Vec<String>> {
    let path = path.split(['?', '#']).next().unwrap_or_default();

    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|raw| {
            let segment = urlencoding::decode(raw).ok()?;
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('/') {
                return None;
            }
            Some(segment.into_owned())
        })
        .collect()
}

fn evaluate(
    policy: &PermissionPolicy,
    admin: Option<&AdminIdentity>,
    resource: Resource,
    action: Action,
    team: Option<&str>,
) -> bool {
    let Some(admin) = admin else {
        return false;
    };

    match admin.role() {
        Role::SuperAdmin => true,
        Role::Admin => !policy.is_super_admin_only(resource),
        Role::TeamMember(memberships) => {
            if policy.is_super_admin_only(resource) {
                return false;
            }

            if let Some(team) = team {
                return ceiling_in(memberships, team).is_some_and(|c| c.covers(action));
            }

            if policy
                .member_default(resource)
                .is_some_and(|grant| grant.covers(action))
            {
                return true;
            }

            policy
                .owner(resource)
                .and_then(|slug| ceiling_in(memberships, slug))
                .is_some_and(|c| c.covers(action))
        }
    }
}

fn ceiling_in(memberships: &[TeamMembership], slug: &str) -> Option<Action> {
    memberships
        .iter()
        .filter(|m| m.team.slug == slug)
        .map(|m| m.role.ceiling())
        .max()
}
