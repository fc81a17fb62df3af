//! Managed resources and the actions that can be taken on them.

use serde::{Deserialize, Serialize};

/// A category of content or setting managed through the admin panel.
///
/// The set is closed: permission policies that name anything else fail to
/// load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Dashboard,
    Events,
    Blog,
    /// Public team profiles shown on the website.
    Team,
    Sponsors,
    Linktree,
    Newsletter,
    Emails,
    Attendance,
    Tasks,
    Finances,
    Settings,
    /// Internal teams and their memberships.
    Teams,
    AdminUsers,
    SecurityPolicy,
}

impl Resource {
    /// Every resource, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Dashboard,
        Self::Events,
        Self::Blog,
        Self::Team,
        Self::Sponsors,
        Self::Linktree,
        Self::Newsletter,
        Self::Emails,
        Self::Attendance,
        Self::Tasks,
        Self::Finances,
        Self::Settings,
        Self::Teams,
        Self::AdminUsers,
        Self::SecurityPolicy,
    ];

    /// Returns the `snake_case` name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Events => "events",
            Self::Blog => "blog",
            Self::Team => "team",
            Self::Sponsors => "sponsors",
            Self::Linktree => "linktree",
            Self::Newsletter => "newsletter",
            Self::Emails => "emails",
            Self::Attendance => "attendance",
            Self::Tasks => "tasks",
            Self::Finances => "finances",
            Self::Settings => "settings",
            Self::Teams => "teams",
            Self::AdminUsers => "admin_users",
            Self::SecurityPolicy => "security_policy",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("invalid resource: {s}"))
    }
}

/// An action on a resource.
///
/// Actions are ordered by privilege: `View < Create < Edit < Delete < Manage`.
/// A grant of some action covers every action below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Manage,
}

impl Action {
    /// Every action, lowest privilege first.
    pub const ALL: [Self; 5] = [
        Self::View,
        Self::Create,
        Self::Edit,
        Self::Delete,
        Self::Manage,
    ];

    /// Returns true if a grant of `self` permits `requested`.
    #[must_use]
    pub fn covers(self, requested: Self) -> bool {
        requested <= self
    }

    /// Returns the `snake_case` name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Manage => "manage",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("invalid action: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_action_ordering() {
        assert!(Action::View < Action::Create);
        assert!(Action::Create < Action::Edit);
        assert!(Action::Edit < Action::Delete);
        assert!(Action::Delete < Action::Manage);
    }

    #[test]
    fn test_action_covers() {
        assert!(Action::Manage.covers(Action::Delete));
        assert!(Action::Edit.covers(Action::Edit));
        assert!(!Action::Edit.covers(Action::Delete));
        assert!(!Action::View.covers(Action::Create));
    }

    #[test]
    fn test_resource_names_round_trip_through_from_str() {
        for resource in Resource::ALL {
            assert_eq!(resource.as_str().parse::<Resource>().unwrap(), resource);
        }
        assert!("payroll".parse::<Resource>().is_err());
    }

    #[test]
    fn test_resource_serde_matches_as_str() {
        let json = serde_json::to_string(&Resource::SecurityPolicy).unwrap();
        assert_eq!(json, "\"security_policy\"");
    }
}
