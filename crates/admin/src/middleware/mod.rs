//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Page guard (`/admin` routes only)

pub mod auth;
pub mod guard;
pub mod session;

pub use auth::RequireAdminAuth;
pub use guard::{CheckTicket, GuardState, GuardStep, PageGuard, check, require_page_access};
pub use session::create_session_layer;
