//! Defines the admin-only HTTP routes for user management.

use super::handlers::{get_user_by_id, list_users};
use crate::auth::middleware::{require_admin, require_auth};
use axum::{Router, middleware, routing::get};

pub fn users_router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user_by_id))
        // Layers run outermost-last: authentication happens before the role check.
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn(require_auth))
}
