//! Permission policy: which team owns what, and which page needs what.
//!
//! ## YAML Format
//!
//! ```yaml
//! super_admin_only: [security_policy]
//! owners:
//!   events: events
//! member_defaults:
//!   dashboard: view
//! routes:
//!   - { pattern: /admin/events, resource: events, action: view }
//!   - { pattern: "/admin/teams/{team}/members", resource: teams, action: manage }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use chapter_core::{Action, Resource};

use crate::models::team::is_valid_slug;

/// Policy compiled into the binary.
const BUILTIN_POLICY: &str = include_str!("../../../config/permissions.yaml");

/// Errors loading or validating a permission policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse policy: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("duplicate route pattern {0:?}")]
    DuplicatePattern(String),

    #[error("resource {resource} is owned by invalid team slug {slug:?}")]
    InvalidOwner { resource: Resource, slug: String },

    #[error("super-admin-only resource {0} cannot be granted to team members")]
    SuperAdminOnlyGranted(Resource),
}

// =============================================================================
// File format
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    #[serde(default)]
    super_admin_only: BTreeSet<Resource>,
    #[serde(default)]
    owners: BTreeMap<Resource, String>,
    #[serde(default)]
    member_defaults: BTreeMap<Resource, Action>,
    #[serde(default)]
    routes: Vec<RouteFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteFile {
    pattern: String,
    resource: Resource,
    action: Action,
    #[serde(default)]
    title: Option<String>,
}

// =============================================================================
// Routes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{id}`: any single segment.
    Id,
    /// `{team}`: a single segment naming the team being evaluated.
    Team,
}

/// A page under `/admin` and the permission it requires.
#[derive(Debug, Clone)]
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    title: Option<String>,
    pub resource: Resource,
    pub action: Action,
}

impl Route {
    fn compile(file: RouteFile) -> Result<Self, PolicyError> {
        let invalid = |reason| PolicyError::InvalidPattern {
            pattern: file.pattern.clone(),
            reason,
        };

        let rest = file
            .pattern
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments = Vec::new();
        for part in rest.split('/') {
            let segment = match part {
                "" => return Err(invalid("empty segment")),
                "{id}" => Segment::Id,
                "{team}" => Segment::Team,
                "." | ".." => return Err(invalid("dot segment")),
                _ if part.contains(['{', '}']) => return Err(invalid("unknown placeholder")),
                _ => Segment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        if segments.first() != Some(&Segment::Literal("admin".to_string())) {
            return Err(invalid("must be under /admin"));
        }
        if segments.iter().filter(|s| **s == Segment::Team).count() > 1 {
            return Err(invalid("more than one {team} placeholder"));
        }

        let route = Self {
            pattern: file.pattern,
            segments,
            title: file.title,
            resource: file.resource,
            action: file.action,
        };
        if route.title.is_some() && !route.is_static() {
            return Err(PolicyError::InvalidPattern {
                pattern: route.pattern,
                reason: "titled routes cannot have placeholders",
            });
        }
        Ok(route)
    }

    /// The pattern as written in the policy.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Navigation title. Only titled routes are linked from the dashboard.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// True if the pattern has no placeholders.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    fn matches<'p>(&self, path: &[&'p str]) -> Option<Option<&'p str>> {
        if self.segments.len() != path.len() {
            return None;
        }

        let mut team = None;
        for (segment, part) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(lit) if lit != part => return None,
                Segment::Literal(_) | Segment::Id => {}
                Segment::Team => team = Some(*part),
            }
        }
        Some(team)
    }
}

/// A resolved page requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'p> {
    pub resource: Resource,
    pub action: Action,
    /// The team slug bound by `{team}`, for team-specific pages.
    pub team: Option<&'p str>,
}

// =============================================================================
// Policy
// =============================================================================

/// Validated permission policy.
#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    super_admin_only: BTreeSet<Resource>,
    owners: BTreeMap<Resource, String>,
    member_defaults: BTreeMap<Resource, Action>,
    routes: Vec<Route>,
}

impl PermissionPolicy {
    /// The policy compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded policy is invalid.
    pub fn builtin() -> Result<Self, PolicyError> {
        Self::from_yaml(BUILTIN_POLICY)
    }

    /// Load and validate a policy file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a policy from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown resources or actions, malformed route
    /// patterns, invalid owner slugs, or super-admin-only resources that are
    /// also granted to team members.
    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        let file: PolicyFile = serde_yaml::from_str(yaml)?;

        for (resource, slug) in &file.owners {
            if !is_valid_slug(slug) {
                return Err(PolicyError::InvalidOwner {
                    resource: *resource,
                    slug: slug.clone(),
                });
            }
        }

        let granted = file.owners.keys().chain(file.member_defaults.keys());
        for resource in granted {
            if file.super_admin_only.contains(resource) {
                return Err(PolicyError::SuperAdminOnlyGranted(*resource));
            }
        }

        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(file.routes.len());
        for route in file.routes {
            if !seen.insert(route.pattern.clone()) {
                return Err(PolicyError::DuplicatePattern(route.pattern));
            }
            routes.push(Route::compile(route)?);
        }

        Ok(Self {
            super_admin_only: file.super_admin_only,
            owners: file.owners,
            member_defaults: file.member_defaults,
            routes,
        })
    }

    #[must_use]
    pub fn is_super_admin_only(&self, resource: Resource) -> bool {
        self.super_admin_only.contains(&resource)
    }

    /// Slug of the team that owns `resource`.
    #[must_use]
    pub fn owner(&self, resource: Resource) -> Option<&str> {
        self.owners.get(&resource).map(String::as_str)
    }

    /// Highest action every team member holds on `resource`.
    #[must_use]
    pub fn member_default(&self, resource: Resource) -> Option<Action> {
        self.member_defaults.get(&resource).copied()
    }

    /// Resources whose access derives from team membership.
    pub fn team_scoped(&self) -> impl Iterator<Item = Resource> + '_ {
        self.owners.keys().copied()
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the requirement for a normalized `/admin` path.
    ///
    /// `segments` excludes the leading empty segment, so `/admin/events` is
    /// `["admin", "events"]`. The route with the most literal segments wins;
    /// ties go to the first declared.
    #[must_use]
    pub fn resolve<'p>(&self, segments: &[&'p str]) -> Option<RouteMatch<'p>> {
        let mut best: Option<(&Route, Option<&'p str>)> = None;

        for route in &self.routes {
            let Some(team) = route.matches(segments) else {
                continue;
            };
            let better = best.is_none_or(|(current, _)| route.literal_count() > current.literal_count());
            if better {
                best = Some((route, team));
            }
        }

        best.map(|(route, team)| RouteMatch {
            resource: route.resource,
            action: route.action,
            team,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_policy_is_valid() {
        let policy = PermissionPolicy::builtin().unwrap();
        assert!(policy.is_super_admin_only(Resource::SecurityPolicy));
        assert_eq!(policy.owner(Resource::Events), Some("events"));
        assert_eq!(policy.member_default(Resource::Dashboard), Some(Action::View));
        assert!(!policy.routes().is_empty());
    }

    #[test]
    fn test_resolve_prefers_literal_segments() {
        let policy = PermissionPolicy::from_yaml(
            r#"
routes:
  - { pattern: "/admin/events/{id}", resource: events, action: view }
  - { pattern: /admin/events/new, resource: events, action: create }
"#,
        )
        .unwrap();

        let hit = policy.resolve(&["admin", "events", "new"]).unwrap();
        assert_eq!(hit.action, Action::Create);

        let hit = policy.resolve(&["admin", "events", "42"]).unwrap();
        assert_eq!(hit.action, Action::View);

        assert!(policy.resolve(&["admin", "events", "42", "x"]).is_none());
    }

    #[test]
    fn test_resolve_binds_team() {
        let policy = PermissionPolicy::builtin().unwrap();
        let hit = policy
            .resolve(&["admin", "teams", "events", "members"])
            .unwrap();
        assert_eq!(hit.resource, Resource::Teams);
        assert_eq!(hit.action, Action::Manage);
        assert_eq!(hit.team, Some("events"));
    }

    #[test]
    fn test_rejects_unknown_resource() {
        let err = PermissionPolicy::from_yaml("super_admin_only: [payroll]").unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[test]
    fn test_rejects_bad_patterns() {
        for pattern in [
            "admin/events",
            "/admin//events",
            "/admin/events/",
            "/public/events",
            "/admin/{slug}",
            "/admin/{team}/{team}",
            "/admin/../finances",
        ] {
            let yaml = format!(
                "routes:\n  - {{ pattern: \"{pattern}\", resource: events, action: view }}\n"
            );
            let err = PermissionPolicy::from_yaml(&yaml).unwrap_err();
            assert!(
                matches!(err, PolicyError::InvalidPattern { .. }),
                "{pattern} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn test_rejects_titled_placeholder_route() {
        let err = PermissionPolicy::from_yaml(
            r#"
routes:
  - { pattern: "/admin/blog/{id}/edit", resource: blog, action: edit, title: Edit }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPattern { .. }));
    }

    #[test]
    fn test_rejects_duplicate_pattern() {
        let err = PermissionPolicy::from_yaml(
            r"
routes:
  - { pattern: /admin/blog, resource: blog, action: view }
  - { pattern: /admin/blog, resource: blog, action: edit }
",
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::DuplicatePattern(_)));
    }

    #[test]
    fn test_rejects_granting_super_admin_only() {
        let err = PermissionPolicy::from_yaml(
            r"
super_admin_only: [finances]
owners:
  finances: finance
",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::SuperAdminOnlyGranted(Resource::Finances)
        ));
    }

    #[test]
    fn test_rejects_invalid_owner_slug() {
        let err = PermissionPolicy::from_yaml("owners:\n  events: Events Team\n").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidOwner { .. }));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = PermissionPolicy::load(Path::new("/nonexistent/permissions.yaml")).unwrap_err();
        assert!(matches!(err, PolicyError::Io { .. }));
    }
}
