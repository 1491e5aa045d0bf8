//! # Taskdeck API Server Library
//!
//! Core functionality for the Taskdeck API server.
//!
//! ## Modules
//!
//! - `app`: application state, router, and the bearer-token auth gate
//! - `avatar`: avatar upload validation and PNG re-encoding
//! - `config`: configuration loaded once from the environment
//! - `email`: fire-and-forget account notification emails
//! - `error`: error handling and HTTP response mapping
//! - `routes`: route handlers

pub mod app;
pub mod avatar;
pub mod config;
pub mod email;
pub mod error;
pub mod routes;
