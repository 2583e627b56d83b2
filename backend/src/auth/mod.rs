//! Authentication module for managing user accounts, sessions, and access control.
//!
//! This module provides the public interface for signup, email verification,
//! password and Google login, cookie-based session refresh, and the
//! authorization middleware guarding protected routes.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod routes;
pub mod service;
