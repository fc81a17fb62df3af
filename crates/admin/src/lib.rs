//! Chapter Admin library.
//!
//! This crate provides the admin panel as a library, allowing it to be
//! tested and driven from the CLI.
//!
//! # Security
//!
//! Every `/admin` page passes the page guard, which evaluates the permission
//! policy against the signed-in admin's role and team memberships. Any
//! failure on that path denies.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
