//! Role enums for admins and team memberships.

use serde::{Deserialize, Serialize};

use super::permission::Action;

/// Account-level role of an admin user, as stored in the identity store.
///
/// The runtime permission model refines `TeamMember` with the admin's
/// memberships; this enum is only the persisted flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Unrestricted access, including security policy and admin accounts.
    SuperAdmin,
    /// Access to everything except the super-admin-only resources.
    Admin,
    /// Access limited to the teams the admin belongs to.
    TeamMember,
}

impl AdminRole {
    /// Returns the `snake_case` name used in storage and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::TeamMember => "team_member",
        }
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "team_member" => Ok(Self::TeamMember),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

/// Role held within a single team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.team_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Lead,
    CoLead,
    Member,
}

impl TeamRole {
    /// Highest action this in-team role grants on resources owned by the team.
    ///
    /// Leads and co-leads manage their team's resources. Members may view,
    /// create and edit but never delete or manage.
    #[must_use]
    pub const fn ceiling(self) -> Action {
        match self {
            Self::Lead | Self::CoLead => Action::Manage,
            Self::Member => Action::Edit,
        }
    }

    /// Returns the `snake_case` name used in storage and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::CoLead => "co_lead",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TeamRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(Self::Lead),
            "co_lead" => Ok(Self::CoLead),
            "member" => Ok(Self::Member),
            _ => Err(format!("invalid team role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role_parse_display() {
        for role in [AdminRole::SuperAdmin, AdminRole::Admin, AdminRole::TeamMember] {
            assert_eq!(role.to_string().parse::<AdminRole>().unwrap(), role);
        }
        assert!("viewer".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_team_role_ceiling() {
        assert_eq!(TeamRole::Lead.ceiling(), Action::Manage);
        assert_eq!(TeamRole::CoLead.ceiling(), Action::Manage);
        assert_eq!(TeamRole::Member.ceiling(), Action::Edit);
        assert!(TeamRole::Member.ceiling() < Action::Delete);
    }

    #[test]
    fn test_team_role_serde_names() {
        let json = serde_json::to_string(&TeamRole::CoLead).unwrap();
        assert_eq!(json, "\"co_lead\"");
    }
}
