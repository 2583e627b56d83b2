//! Handler functions for admin user management endpoints.
//!
//! Both handlers sit behind `require_auth` and `require_admin`, so they only
//! ever run for a signed-in admin.

use crate::api::common::{
    ApiError, ApiResponse, PaginatedData, PaginationFilter, PaginationMeta, service_error_to_http,
    validation_error_response,
};
use crate::auth::middleware::AuthenticatedUser;
use crate::database::models::UserProfile;
use crate::errors::ServiceError;
use crate::state::AppState;
use axum::extract::{Extension, Json, Path, Query};
use validator::Validate;

/// Lists users, newest first.
#[axum::debug_handler]
pub async fn list_users(
    Extension(state): Extension<AppState>,
    Extension(AuthenticatedUser(admin)): Extension<AuthenticatedUser>,
    Query(filter): Query<PaginationFilter>,
) -> Result<Json<ApiResponse<PaginatedData<UserProfile>>>, ApiError> {
    if let Err(validation_errors) = filter.validate() {
        return Err(validation_error_response(validation_errors));
    }

    tracing::info!(
        "Admin {} listing users (page {}, per_page {})",
        admin.id,
        filter.page(),
        filter.per_page()
    );

    let users = state
        .users
        .list_users(filter.limit(), filter.offset())
        .await
        .map_err(|e| service_error_to_http(ServiceError::from(e)))?;
    let total = state
        .users
        .count_users()
        .await
        .map_err(|e| service_error_to_http(ServiceError::from(e)))?;

    let items: Vec<UserProfile> = users.into_iter().map(UserProfile::from).collect();
    let pagination = PaginationMeta::from_filter(&filter, total);

    Ok(Json(ApiResponse::paginated(
        PaginatedData::new(items, total),
        pagination,
        "Users retrieved successfully",
    )))
}

/// Retrieves a user by its ID.
#[axum::debug_handler]
pub async fn get_user_by_id(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let user = state
        .users
        .get_user_by_id(&id)
        .await
        .map_err(|e| service_error_to_http(ServiceError::from(e)))?
        .ok_or_else(|| service_error_to_http(ServiceError::not_found("User", &id)))?;

    Ok(Json(ApiResponse::success(
        UserProfile::from(user),
        "User retrieved successfully",
    )))
}
