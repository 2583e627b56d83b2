//! Module for collaborator services used by the auth flows.
//!
//! This module holds the outbound mailer and the refresh-token session
//! cache, both consumed through traits so they can be swapped in tests.

pub mod email_service;
pub mod session_cache;
