//! Core business logic for the authentication system.
//!
//! Every successful entry point (login, email verification, Google
//! callback) funnels into `establish_session`, which mints the token pair
//! and records the refresh token as the user's only active session.

use crate::auth::models::*;
use crate::auth::oauth::{ProviderProfile, resolve_federated_identity};
use crate::database::models::{CreateUser, User};
use crate::errors::{ServiceError, ServiceResult, SessionRejection};
use crate::repositories::user_repository::{UserStore, is_duplicate_email};
use crate::services::email_service::Mailer;
use crate::services::session_cache::SessionCache;
use crate::state::AppState;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::generate_random_string::{VERIFICATION_TOKEN_LENGTH, generate_random_string};
use crate::utils::jwt::{TokenError, TokenIssuer, TokenPair};
use crate::utils::normalize_email;
use validator::Validate;

/// A user together with the session that was just established for them.
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    pub user: User,
    pub tokens: TokenPair,
}

/// Authentication service for signup, login, verification and session handling
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    sessions: &'a dyn SessionCache,
    mailer: &'a dyn Mailer,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance
    pub fn new(state: &'a AppState) -> Self {
        AuthService {
            users: state.users.as_ref(),
            sessions: state.sessions.as_ref(),
            mailer: state.mailer.as_ref(),
            tokens: state.tokens.as_ref(),
        }
    }

    /// Register a password account and email it a verification link.
    ///
    /// No session is issued: the account cannot log in until verified.
    pub async fn signup(&self, request: SignupRequest) -> ServiceResult<User> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.users.get_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::already_exists("User", email));
        }

        let password_hash = hash_password(&request.password).await?;
        let verification_token = generate_random_string(VERIFICATION_TOKEN_LENGTH);

        let user = self
            .users
            .create_user(CreateUser::with_password(
                request.name.trim().to_string(),
                email.clone(),
                password_hash,
                verification_token.clone(),
            ))
            .await
            .map_err(|e| {
                // Two signups for the same email can race past the lookup above
                if is_duplicate_email(&e) {
                    ServiceError::already_exists("User", &email)
                } else {
                    ServiceError::Database { source: e }
                }
            })?;

        self.mailer
            .send_verification_email(&user.email, &user.name, &verification_token)
            .await?;

        tracing::info!("User {} signed up, verification email sent", user.id);
        Ok(user)
    }

    /// Consume a verification token and log the user in.
    pub async fn verify_email(&self, request: VerifyEmailRequest) -> ServiceResult<EstablishedSession> {
        request.validate()?;

        let user = self
            .users
            .consume_verification_token(request.token.trim())
            .await?
            .ok_or_else(|| ServiceError::invalid_token("Invalid or expired verification token"))?;

        tracing::info!("User {} verified their email", user.id);
        self.establish_session(user).await
    }

    /// Issue a fresh verification token for an unverified password account.
    ///
    /// Unknown, verified and password-less accounts are silently ignored so the
    /// response never reveals whether an email is registered.
    pub async fn resend_verification(&self, request: ResendVerificationRequest) -> ServiceResult<()> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let Some(mut user) = self.users.get_user_by_email(&email).await? else {
            return Ok(());
        };
        if user.is_verified || user.password_hash.is_none() {
            return Ok(());
        }

        let verification_token = generate_random_string(VERIFICATION_TOKEN_LENGTH);
        user.verification_token = Some(verification_token.clone());
        let user = self.users.update_user(&user).await?;

        self.mailer
            .send_verification_email(&user.email, &user.name, &verification_token)
            .await
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email and wrong password are indistinguishable; an unverified
    /// account with the right password gets its own rejection.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<EstablishedSession> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let user = self.users.get_user_by_email(&email).await?;

        // Unknown emails and password-less accounts still pay for one bcrypt round
        let stored_hash = user.as_ref().and_then(|user| user.password_hash.as_deref());
        let password_matches = verify_password(&request.password, stored_hash).await;

        let user = match user {
            Some(user) if password_matches => user,
            _ => {
                tracing::warn!("Rejected login attempt");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        if !user.is_verified {
            return Err(ServiceError::EmailNotVerified);
        }

        tracing::info!("User {} logged in", user.id);
        self.establish_session(user).await
    }

    /// Log in a user resolved from an OAuth provider profile.
    pub async fn complete_federated_login(
        &self,
        profile: &ProviderProfile,
    ) -> ServiceResult<EstablishedSession> {
        let user = resolve_federated_identity(self.users, profile).await?;
        tracing::info!("User {} signed in with Google", user.id);
        self.establish_session(user).await
    }

    /// Mint a token pair and record the refresh token as the user's only session.
    ///
    /// Overwrites any earlier refresh token, which stops being accepted.
    pub async fn establish_session(&self, user: User) -> ServiceResult<EstablishedSession> {
        let tokens = self.tokens.issue(&user.id).map_err(signing_failure)?;

        self.sessions
            .put(&user.id, &tokens.refresh_token)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store session for user {}: {}", user.id, e);
                ServiceError::session_store(e)
            })?;

        Ok(EstablishedSession { user, tokens })
    }

    /// Exchange the refresh-token cookie for a new access token.
    ///
    /// The refresh token itself is not rotated; it stays valid until it
    /// expires or a newer session replaces it.
    pub async fn refresh_access_token(&self, refresh_token: Option<&str>) -> ServiceResult<String> {
        let refresh_token =
            refresh_token.ok_or(ServiceError::session_rejected(SessionRejection::MissingToken))?;

        let claims = self
            .tokens
            .validate_refresh(refresh_token)
            .map_err(|_| ServiceError::session_rejected(SessionRejection::InvalidToken))?;

        let stored = self
            .sessions
            .get(&claims.user_id)
            .await
            .map_err(ServiceError::session_store)?;

        match stored {
            None => {
                return Err(ServiceError::session_rejected(
                    SessionRejection::NoActiveSession,
                ));
            }
            Some(current) if current != refresh_token => {
                tracing::warn!(
                    "Superseded refresh token presented for user {}",
                    &claims.user_id
                );
                return Err(ServiceError::session_rejected(SessionRejection::Superseded));
            }
            Some(_) => {}
        }

        self.tokens
            .access_token(&claims.user_id)
            .map_err(signing_failure)
    }

    /// End the session named by the refresh-token cookie, if it can be decoded.
    ///
    /// A missing or undecodable cookie is not an error; a cache failure is.
    pub async fn logout(&self, refresh_token: Option<&str>) -> ServiceResult<()> {
        let Some(refresh_token) = refresh_token else {
            return Ok(());
        };

        match self.tokens.validate_refresh(refresh_token) {
            Ok(claims) => {
                self.sessions
                    .delete(&claims.user_id)
                    .await
                    .map_err(ServiceError::session_store)?;
                tracing::info!("User {} logged out", &claims.user_id);
            }
            Err(e) => tracing::debug!("Ignoring undecodable refresh token on logout: {}", e),
        }
        Ok(())
    }

    /// Resolve an access-token cookie to the user it names.
    pub async fn authenticate(&self, access_token: Option<&str>) -> ServiceResult<User> {
        let access_token = access_token
            .ok_or_else(|| ServiceError::unauthenticated("No token provided"))?;

        let claims = self
            .tokens
            .validate_access(access_token)
            .map_err(|e| match e {
                TokenError::Expired => ServiceError::TokenExpired,
                _ => ServiceError::unauthenticated("Invalid token"),
            })?;

        self.users
            .get_user_by_id(&claims.user_id)
            .await?
            .ok_or_else(|| ServiceError::unauthenticated("User not found"))
    }
}

fn signing_failure(error: TokenError) -> ServiceError {
    tracing::error!("Token generation failed: {}", error);
    ServiceError::internal_error("Token generation failed")
}
