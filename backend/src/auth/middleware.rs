//! Middleware for protecting authenticated routes and handling authorization.
//!
//! `require_auth` resolves the `accessToken` cookie to a user and attaches
//! it to the request; `require_admin` is layered inside it on admin routes.

use crate::api::common::{ApiError, service_error_to_http};
use crate::auth::service::AuthService;
use crate::database::models::UserProfile;
use crate::errors::ServiceError;
use crate::state::AppState;
use crate::utils::cookies::{ACCESS_TOKEN_COOKIE, read_cookie};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

/// The signed-in user, with credentials stripped.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserProfile);

/// Cookie authentication middleware
pub async fn require_auth(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = read_cookie(request.headers(), ACCESS_TOKEN_COOKIE);

    let user = AuthService::new(&state)
        .authenticate(token.as_deref())
        .await
        .map_err(service_error_to_http)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser(UserProfile::from(user)));
    Ok(next.run(request).await)
}

/// Admin role authorization middleware. Must run after `require_auth`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| service_error_to_http(ServiceError::unauthenticated("No token provided")))?;

    if !user.0.is_admin() {
        tracing::warn!("User {} denied access to admin route", user.0.id);
        return Err(service_error_to_http(ServiceError::permission_denied(
            "Access denied: Admins only",
        )));
    }

    Ok(next.run(request).await)
}
