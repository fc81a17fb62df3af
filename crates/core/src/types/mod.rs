//! Core types for the chapter admin panel.
//!
//! This module provides type-safe wrappers for the access-control domain.

pub mod email;
pub mod id;
pub mod permission;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use permission::{Action, Resource};
pub use role::{AdminRole, TeamRole};
