//! Admin user domain types.
//!
//! These types represent validated domain objects read from the identity store.

use chrono::{DateTime, Utc};

use chapter_core::{AdminUserId, Email};

// Re-export AdminRole from core for convenience
pub use chapter_core::AdminRole;

/// An admin user (domain type).
///
/// The identity store owns this record; the admin context only ever holds a
/// read-only copy for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Account-level role.
    pub role: AdminRole,
    /// Inactive admins cannot log in and their sessions are discarded.
    pub is_active: bool,
    /// Last successful login, if any.
    pub last_login_at: Option<DateTime<Utc>>,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
    /// When the admin was last updated.
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    /// Returns true for super admins.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }

    /// Returns true for admins and super admins.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, AdminRole::SuperAdmin | AdminRole::Admin)
    }
}
