//! Chapter Core - Shared types library.
//!
//! This crate provides common types used across the chapter website tooling:
//! - `admin` - Admin panel (identity, permissions, guarded pages)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, roles, resources and actions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
