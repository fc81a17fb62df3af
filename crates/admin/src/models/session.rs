//! Persisted session slot for admin authentication.
//!
//! One slot per browser context (or CLI profile). The JSON shape is fixed so
//! that every slot implementation stores the same thing:
//!
//! ```json
//! { "authenticated": true, "adminId": "…", "email": "…", "expires": 1767225600000 }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use chapter_core::AdminUserId;

use super::admin_user::AdminUser;

/// Fixed session lifetime in hours. Sessions are never extended.
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Session-stored admin identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub authenticated: bool,
    pub admin_id: String,
    pub email: String,
    /// Expiry as epoch milliseconds.
    pub expires: i64,
}

impl StoredSession {
    /// Issue a new session for `admin`, expiring [`SESSION_LIFETIME_HOURS`] after `now`.
    #[must_use]
    pub fn issue(admin: &AdminUser, now: DateTime<Utc>) -> Self {
        Self {
            authenticated: true,
            admin_id: admin.id.to_string(),
            email: admin.email.to_string(),
            expires: (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp_millis(),
        }
    }

    /// Returns true once `now` is past the expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires
    }

    /// The admin this session belongs to, if the slot is usable at `now`.
    ///
    /// Returns `None` for expired or unauthenticated slots and for slots whose
    /// admin ID does not parse.
    #[must_use]
    pub fn valid_admin_id(&self, now: DateTime<Utc>) -> Option<AdminUserId> {
        if !self.authenticated || self.is_expired(now) {
            return None;
        }
        AdminUserId::parse(&self.admin_id).ok()
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the persisted [`super::StoredSession`] slot.
    pub const ADMIN_SESSION: &str = "admin_session";

    /// Key for the admin's selected team.
    pub const CURRENT_TEAM: &str = "current_team";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chapter_core::{AdminRole, Email};

    use super::*;

    fn admin() -> AdminUser {
        let now = Utc::now();
        AdminUser {
            id: AdminUserId::generate(),
            email: Email::parse("vp@chapter.edu").unwrap(),
            name: "Vice President".to_string(),
            role: AdminRole::Admin,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_sets_24_hour_expiry() {
        let now = Utc::now();
        let admin = admin();
        let session = StoredSession::issue(&admin, now);

        assert!(session.authenticated);
        assert_eq!(session.admin_id, admin.id.to_string());
        assert_eq!(session.expires - now.timestamp_millis(), 24 * 60 * 60 * 1000);
        assert_eq!(session.valid_admin_id(now), Some(admin.id));
    }

    #[test]
    fn test_expired_session_has_no_admin() {
        let issued = Utc::now() - Duration::hours(25);
        let session = StoredSession::issue(&admin(), issued);
        assert!(session.is_expired(Utc::now()));
        assert_eq!(session.valid_admin_id(Utc::now()), None);
    }

    #[test]
    fn test_unauthenticated_or_garbled_slot_is_unusable() {
        let now = Utc::now();
        let mut session = StoredSession::issue(&admin(), now);
        session.authenticated = false;
        assert_eq!(session.valid_admin_id(now), None);

        let mut session = StoredSession::issue(&admin(), now);
        session.admin_id = "42".to_string();
        assert_eq!(session.valid_admin_id(now), None);
    }

    #[test]
    fn test_json_shape() {
        let session = StoredSession {
            authenticated: true,
            admin_id: "00000000-0000-0000-0000-000000000000".to_string(),
            email: "vp@chapter.edu".to_string(),
            expires: 1_767_225_600_000,
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "authenticated": true,
                "adminId": "00000000-0000-0000-0000-000000000000",
                "email": "vp@chapter.edu",
                "expires": 1_767_225_600_000_i64,
            })
        );
    }
}
