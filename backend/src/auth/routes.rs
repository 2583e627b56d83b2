//! Defines the HTTP routes specifically for authentication.
//!
//! Mounted under `/api/auth` by the main router.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/verify-email", post(verify_email))
        .route("/resend-verification", post(resend_verification))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route(
            "/profile",
            get(profile).layer(middleware::from_fn(require_auth)),
        )
        .route("/google", get(google_login))
        .route("/google/callback", get(google_callback))
}
