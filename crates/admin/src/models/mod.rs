//! Domain models for admin.

pub mod admin_user;
pub mod identity;
pub mod session;
pub mod team;

pub use admin_user::{AdminRole, AdminUser};
pub use identity::{AdminIdentity, CurrentAdmin, Role};
pub use session::{StoredSession, keys as session_keys};
pub use team::{Team, TeamMember, TeamMembership};
