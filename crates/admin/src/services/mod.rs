//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Admin identity provider (`AdminContext`) and its store traits
//! - `permissions` - Permission policy and evaluator
//! - `session_store` - Persistent session slot (cookie, file, memory)
//! - `site_status` - Memoized public site status

pub mod auth;
pub mod permissions;
pub mod session_store;
pub mod site_status;

pub use auth::{AdminAuthError, AdminContext, IdentityStore, MemoryDirectory, MembershipStore};
pub use permissions::{PermissionPolicy, PolicyError};
pub use session_store::{
    CookieSessionStore, FileSessionStore, MemorySessionStore, SessionStore, SessionStoreError,
};
pub use site_status::{SiteStatus, SiteStatusService, SiteStatusSource};
