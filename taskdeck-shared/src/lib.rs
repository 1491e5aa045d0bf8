//! # Taskdeck Shared Library
//!
//! Types and business logic shared by the Taskdeck API server.
//!
//! ## Module Organization
//!
//! - `models`: database models (users, tasks)
//! - `auth`: password hashing, session tokens, and the session lifecycle
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
