//! Integration tests for the chapter admin access model.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p chapter-integration-tests
//! ```
//!
//! Everything runs against the in-memory directory and session slot, so no
//! database is needed.
//!
//! # Test Categories
//!
//! - `permission_properties` - role and membership evaluation
//! - `session_lifecycle` - login, restore, expiry and logout
//! - `guard_race` - stale permission checks after navigation
//! - `page_access` - route table scenarios

use std::sync::Arc;

use secrecy::SecretString;

use chapter_admin::models::{AdminIdentity, AdminUser, Team, TeamMembership};
use chapter_admin::services::{
    AdminContext, MemoryDirectory, MemorySessionStore, MembershipStore, PermissionPolicy,
};
use chapter_core::{AdminRole, Email, TeamRole};

/// Password given to every fixture admin.
pub const PASSWORD: &str = "correct horse battery staple";

/// Identity provider wired to in-memory stores.
pub type TestContext = AdminContext<MemorySessionStore, MemoryDirectory, MemoryDirectory>;

/// A chapter with the teams the built-in policy names as owners.
pub struct Chapter {
    pub directory: MemoryDirectory,
    pub policy: Arc<PermissionPolicy>,
    pub events: Team,
    pub marketing: Team,
    pub finance: Team,
    pub operations: Team,
}

impl Default for Chapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Chapter {
    /// # Panics
    ///
    /// Panics if the built-in policy fails validation.
    #[must_use]
    pub fn new() -> Self {
        let directory = MemoryDirectory::new();
        let policy = PermissionPolicy::builtin().expect("built-in policy is valid");

        Self {
            events: directory.add_team("Events", "events", "#e4572e"),
            marketing: directory.add_team("Marketing", "marketing", "#29335c"),
            finance: directory.add_team("Finance", "finance", "#17bebb"),
            operations: directory.add_team("Operations", "operations", "#ffc914"),
            directory,
            policy: Arc::new(policy),
        }
    }

    /// Register an admin whose password is [`PASSWORD`].
    ///
    /// # Panics
    ///
    /// Panics if `email` is not a valid address.
    #[must_use]
    pub fn admin(&self, email: &str, role: AdminRole) -> AdminUser {
        let email = Email::parse(email).expect("fixture email is valid");
        let name = email.as_str().split('@').next().unwrap_or_default().to_string();
        self.directory.add_admin(email, &name, role, PASSWORD)
    }

    /// Put `admin` on `team`.
    ///
    /// # Panics
    ///
    /// Panics if the directory rejects the membership.
    pub async fn join(&self, admin: &AdminUser, team: &Team, role: TeamRole) -> TeamMembership {
        self.directory
            .add_membership(admin.id, team.id, role)
            .await
            .expect("fixture membership is accepted")
    }

    /// Snapshot of `admin` with their current memberships.
    ///
    /// # Panics
    ///
    /// Panics if the directory is offline.
    pub async fn identity(&self, admin: &AdminUser) -> AdminIdentity {
        let memberships = self
            .directory
            .get_user_teams(admin.id)
            .await
            .expect("directory is online");
        AdminIdentity::new(admin.clone(), &memberships)
    }

    /// A fresh identity provider sharing this chapter's directory and `slot`.
    #[must_use]
    pub fn context(&self, slot: &MemorySessionStore) -> TestContext {
        AdminContext::new(
            slot.clone(),
            self.directory.clone(),
            self.directory.clone(),
            Arc::clone(&self.policy),
        )
    }

    /// Sign `admin` in on a fresh slot and return the context and slot.
    ///
    /// # Panics
    ///
    /// Panics if sign-in fails.
    pub async fn signed_in(&self, admin: &AdminUser) -> (TestContext, MemorySessionStore) {
        let slot = MemorySessionStore::new();
        let mut ctx = self.context(&slot);
        ctx.login(admin.email.as_str(), &password())
            .await
            .expect("fixture admin signs in");
        (ctx, slot)
    }
}

/// [`PASSWORD`] as a secret.
#[must_use]
pub fn password() -> SecretString {
    SecretString::from(PASSWORD)
}
