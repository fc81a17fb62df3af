//! Team and team membership domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chapter_core::{AdminUserId, MembershipId, TeamId, TeamRole};

/// An organizational sub-unit of the chapter (a committee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// Unique, URL-safe name. Permission policies refer to teams by slug.
    pub slug: String,
    /// Display color (CSS hex).
    pub color: String,
}

/// Relates an admin to a team with a role inside that team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
    pub id: MembershipId,
    pub admin_user_id: AdminUserId,
    pub team: Team,
    pub role: TeamRole,
    pub created_at: DateTime<Utc>,
}

/// A row of a team roster, joined with the member's account details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub membership_id: MembershipId,
    pub admin_user_id: AdminUserId,
    pub name: String,
    pub email: String,
    pub role: TeamRole,
}

/// Returns true if `slug` is lowercase ASCII words joined by single hyphens.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("events"));
        assert!(is_valid_slug("public-relations"));
        assert!(is_valid_slug("team-2026"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Events"));
        assert!(!is_valid_slug("-events"));
        assert!(!is_valid_slug("events--team"));
        assert!(!is_valid_slug("events team"));
    }
}
