//! Central module for organizing the application's main API endpoints.
//!
//! Core authentication routes live in `crate::auth`; this module holds the
//! shared response envelope and the admin-only user endpoints.

pub mod common;
pub mod users;
