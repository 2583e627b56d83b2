//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for signup, login, email
//! verification, token refresh and Google sign-in, and translate
//! `auth::service` results into cookies and JSON envelopes. Payload
//! validation happens in the service.

use crate::api::common::{ApiError, ApiResponse, service_error_to_http};
use crate::auth::middleware::AuthenticatedUser;
use crate::auth::models::*;
use crate::auth::service::{AuthService, EstablishedSession};
use crate::database::models::UserProfile;
use crate::errors::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::utils::cookies::{
    OAUTH_STATE_COOKIE, REFRESH_TOKEN_COOKIE, access_cookie, clear_oauth_state_cookie,
    clear_session_cookies, oauth_state_cookie, read_cookie, session_cookies,
};
use crate::utils::generate_random_string::{OAUTH_STATE_LENGTH, generate_random_string};
use axum::{
    extract::{Extension, Json, Query},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};

type SessionResponse = (HeaderMap, Json<ApiResponse<UserSummary>>);

fn session_response(
    state: &AppState,
    session: EstablishedSession,
    message: &str,
) -> Result<SessionResponse, ApiError> {
    let cookies = session_cookies(&session.tokens, state.config.secure_cookies())
        .map_err(service_error_to_http)?;
    Ok((
        cookies,
        Json(ApiResponse::success(UserSummary::from(&session.user), message)),
    ))
}

/// Handle user signup request
#[axum::debug_handler]
pub async fn signup(
    Extension(state): Extension<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    AuthService::new(&state)
        .signup(payload)
        .await
        .map_err(service_error_to_http)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message(
            "Signup successful. Please check your email to verify your account.",
        )),
    ))
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<SessionResponse, ApiError> {
    let session = AuthService::new(&state)
        .login(payload)
        .await
        .map_err(service_error_to_http)?;

    session_response(&state, session, "Logged in successfully")
}

/// Handle email verification; a valid token logs the user in
#[axum::debug_handler]
pub async fn verify_email(
    Extension(state): Extension<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<SessionResponse, ApiError> {
    let session = AuthService::new(&state)
        .verify_email(payload)
        .await
        .map_err(service_error_to_http)?;

    session_response(&state, session, "Email verified successfully")
}

#[axum::debug_handler]
pub async fn resend_verification(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ResendVerificationRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    AuthService::new(&state)
        .resend_verification(payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::message(
        "If that account is awaiting verification, a new email has been sent.",
    )))
}

/// Handle logout. Session cookies are cleared even when the request fails.
#[axum::debug_handler]
pub async fn logout(Extension(state): Extension<AppState>, headers: HeaderMap) -> Response {
    let refresh_token = read_cookie(&headers, REFRESH_TOKEN_COOKIE);
    let cleared = clear_session_cookies(state.config.secure_cookies());

    match AuthService::new(&state).logout(refresh_token.as_deref()).await {
        Ok(()) => (
            cleared,
            Json(ApiResponse::message("Logged out successfully")),
        )
            .into_response(),
        Err(error) => (cleared, service_error_to_http(error)).into_response(),
    }
}

/// Handle token refresh request. Only the access cookie is replaced.
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<ApiResponse<()>>), ApiError> {
    let refresh_token = read_cookie(&headers, REFRESH_TOKEN_COOKIE);

    let access_token = AuthService::new(&state)
        .refresh_access_token(refresh_token.as_deref())
        .await
        .map_err(service_error_to_http)?;

    let mut cookies = HeaderMap::new();
    cookies.append(
        SET_COOKIE,
        access_cookie(&access_token, state.config.secure_cookies())
            .map_err(service_error_to_http)?,
    );

    Ok((
        cookies,
        Json(ApiResponse::message("Token refreshed successfully")),
    ))
}

/// Returns the signed-in user's sanitized record
#[axum::debug_handler]
pub async fn profile(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<ApiResponse<UserProfile>> {
    Json(ApiResponse::success(user, "Profile retrieved successfully"))
}

/// Starts Google sign-in by redirecting to the consent screen.
#[axum::debug_handler]
pub async fn google_login(Extension(state): Extension<AppState>) -> Response {
    let client_url = state.config.client_url.trim_end_matches('/');
    let Some(provider) = state.oauth.as_ref() else {
        return Redirect::to(&format!("{client_url}/login?error=oauth_unavailable"))
            .into_response();
    };

    let oauth_state = generate_random_string(OAUTH_STATE_LENGTH);
    let redirect = provider.authorize_url(&oauth_state).and_then(|url| {
        let cookie = oauth_state_cookie(&oauth_state, state.config.secure_cookies())?;
        Ok((url, cookie))
    });

    match redirect {
        Ok((url, cookie)) => ([(SET_COOKIE, cookie)], Redirect::to(&url)).into_response(),
        Err(e) => {
            tracing::error!("Failed to start Google sign-in: {}", e);
            Redirect::to(&format!("{client_url}/login")).into_response()
        }
    }
}

/// Completes Google sign-in and hands the access token to the frontend.
#[axum::debug_handler]
pub async fn google_callback(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Query(query): Query<OAuthCallbackQuery>,
) -> Response {
    let client_url = state.config.client_url.trim_end_matches('/').to_string();
    let secure = state.config.secure_cookies();

    let outcome = complete_google_login(&state, &headers, query)
        .await
        .and_then(|session| {
            let cookies = session_cookies(&session.tokens, secure)?;
            Ok((cookies, session.tokens.access_token))
        });

    let (mut cookies, target) = match outcome {
        Ok((cookies, access_token)) => (
            cookies,
            format!("{client_url}/auth-success?token={access_token}"),
        ),
        Err(e) => {
            tracing::warn!("Google sign-in failed: {}", e);
            (HeaderMap::new(), format!("{client_url}/login"))
        }
    };

    if let Ok(clear) = clear_oauth_state_cookie(secure) {
        cookies.append(SET_COOKIE, clear);
    }
    (cookies, Redirect::to(&target)).into_response()
}

async fn complete_google_login(
    state: &AppState,
    headers: &HeaderMap,
    query: OAuthCallbackQuery,
) -> ServiceResult<EstablishedSession> {
    let provider = state
        .oauth
        .as_ref()
        .ok_or_else(|| ServiceError::external_service("Google sign-in is not configured"))?;

    if let Some(error) = query.error {
        return Err(ServiceError::external_service(format!(
            "Google returned an error: {error}"
        )));
    }

    let expected_state = read_cookie(headers, OAUTH_STATE_COOKIE);
    match (expected_state, query.state) {
        (Some(expected), Some(actual)) if expected == actual => {}
        _ => return Err(ServiceError::invalid_token("OAuth state mismatch")),
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ServiceError::invalid_token("Missing authorization code"))?;

    let profile = provider.exchange(&code).await?;
    AuthService::new(state).complete_federated_login(&profile).await
}
