//! Google OAuth provider adapter and federated identity resolution.
//!
//! The provider only turns an authorization code into a profile. Mapping
//! that profile onto a local user happens in `resolve_federated_identity`,
//! after which the normal login-success sequence takes over.

use crate::config::GoogleOAuthConfig;
use crate::database::models::{CreateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserStore;
use crate::utils::normalize_email;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Identity reported by the external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL the browser is sent to for consent, carrying `state` for CSRF protection.
    fn authorize_url(&self, state: &str) -> ServiceResult<String>;

    /// Exchanges an authorization code for the user's profile.
    async fn exchange(&self, code: &str) -> ServiceResult<ProviderProfile>;
}

pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn authorize_url(&self, state: &str) -> ServiceResult<String> {
        let url = Url::parse_with_params(
            GOOGLE_AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| ServiceError::internal_error(format!("Invalid authorize URL: {e}")))?;

        Ok(url.to_string())
    }

    async fn exchange(&self, code: &str) -> ServiceResult<ProviderProfile> {
        let token = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                tracing::error!("Google token exchange failed: {}", e);
                ServiceError::external_service("Google token exchange failed")
            })?
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| {
                tracing::error!("Google token response was malformed: {}", e);
                ServiceError::external_service("Google token exchange failed")
            })?;

        let info = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                tracing::error!("Google userinfo request failed: {}", e);
                ServiceError::external_service("Google profile lookup failed")
            })?
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| {
                tracing::error!("Google userinfo response was malformed: {}", e);
                ServiceError::external_service("Google profile lookup failed")
            })?;

        profile_from_userinfo(info)
    }
}

fn profile_from_userinfo(info: GoogleUserInfo) -> ServiceResult<ProviderProfile> {
    let email = info
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| ServiceError::external_service("Google profile has no email"))?;

    // Accounts are linked by email, so only provider-verified addresses are trusted.
    if info.email_verified == Some(false) {
        return Err(ServiceError::external_service(
            "Google email address is not verified",
        ));
    }

    let name = info
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Ok(ProviderProfile {
        id: info.sub,
        email,
        name,
        picture: info.picture,
    })
}

/// Maps a provider profile onto a local user.
///
/// An existing account with the same email gets the federated id linked and
/// is marked verified, losing its password if it was still unverified.
/// Otherwise a verified, password-less user is created.
pub async fn resolve_federated_identity(
    users: &dyn UserStore,
    profile: &ProviderProfile,
) -> ServiceResult<User> {
    let email = normalize_email(&profile.email);

    if let Some(mut user) = users.get_user_by_email(&email).await? {
        if user.google_id.is_none() {
            user.google_id = Some(profile.id.clone());
            if let Some(picture) = &profile.picture {
                user.image = picture.clone();
            }
            // An unverified password was never proven to belong to this owner
            if !user.is_verified {
                user.password_hash = None;
            }
            user.is_verified = true;
            user.verification_token = None;
            user = users.update_user(&user).await?;
            tracing::info!("Linked Google identity to existing user {}", user.id);
        }
        return Ok(user);
    }

    let user = users
        .create_user(CreateUser::federated(
            profile.name.clone(),
            email,
            profile.id.clone(),
            profile.picture.clone().unwrap_or_default(),
        ))
        .await?;
    tracing::info!("Created user {} from Google sign-in", user.id);

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::UserRole;
    use crate::repositories::user_repository::UserRepository;
    use crate::test_support::memory_pool;

    fn profile(email: &str) -> ProviderProfile {
        ProviderProfile {
            id: "google-123".into(),
            email: email.into(),
            name: "Ann Google".into(),
            picture: Some("https://lh3.example/ann.png".into()),
        }
    }

    #[tokio::test]
    async fn creates_verified_user_without_password() {
        let repo = UserRepository::new(memory_pool().await);
        let user = resolve_federated_identity(&repo, &profile("Ann@X.com"))
            .await
            .unwrap();

        assert_eq!(user.email, "ann@x.com");
        assert!(user.is_verified);
        assert!(user.password_hash.is_none());
        assert_eq!(user.google_id.as_deref(), Some("google-123"));
        assert_eq!(user.role, UserRole::Customer);
    }

    #[tokio::test]
    async fn linking_unverified_account_drops_its_password() {
        let repo = UserRepository::new(memory_pool().await);
        let existing = repo
            .create_user(CreateUser::with_password(
                "Ann".into(),
                "ann@x.com".into(),
                "$2b$10$hash".into(),
                "pending-token".into(),
            ))
            .await
            .unwrap();

        let user = resolve_federated_identity(&repo, &profile("ann@x.com"))
            .await
            .unwrap();

        assert_eq!(user.id, existing.id);
        assert!(user.is_verified);
        assert!(user.verification_token.is_none());
        assert_eq!(user.google_id.as_deref(), Some("google-123"));
        assert!(user.password_hash.is_none());
        assert_eq!(user.image, "https://lh3.example/ann.png");
    }

    #[tokio::test]
    async fn linking_verified_account_keeps_its_password() {
        let repo = UserRepository::new(memory_pool().await);
        repo.create_user(CreateUser::with_password(
            "Ann".into(),
            "ann@x.com".into(),
            "$2b$10$hash".into(),
            "pending-token".into(),
        ))
        .await
        .unwrap();
        let existing = repo
            .consume_verification_token("pending-token")
            .await
            .unwrap()
            .unwrap();

        let user = resolve_federated_identity(&repo, &profile("ann@x.com"))
            .await
            .unwrap();

        assert_eq!(user.id, existing.id);
        assert_eq!(user.google_id.as_deref(), Some("google-123"));
        assert_eq!(user.password_hash.as_deref(), Some("$2b$10$hash"));
    }

    #[tokio::test]
    async fn repeat_sign_in_reuses_account() {
        let repo = UserRepository::new(memory_pool().await);
        let first = resolve_federated_identity(&repo, &profile("ann@x.com"))
            .await
            .unwrap();
        let second = resolve_federated_identity(&repo, &profile("ann@x.com"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[test]
    fn authorize_url_carries_state() {
        let client = GoogleOAuthClient::new(GoogleOAuthConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            callback_url: "http://localhost:5000/api/auth/google/callback".into(),
        });
        let url = client.authorize_url("xyz").unwrap();

        assert!(url.starts_with(GOOGLE_AUTHORIZE_URL));
        assert!(url.contains("state=xyz"));
        assert!(url.contains("client_id=client"));
    }

    #[test]
    fn unverified_google_email_is_refused() {
        let info = GoogleUserInfo {
            sub: "1".into(),
            email: Some("a@x.com".into()),
            email_verified: Some(false),
            name: None,
            picture: None,
        };
        assert!(matches!(
            profile_from_userinfo(info),
            Err(ServiceError::ExternalService { .. })
        ));
    }

    #[test]
    fn missing_name_falls_back_to_local_part() {
        let info = GoogleUserInfo {
            sub: "1".into(),
            email: Some("ann@x.com".into()),
            email_verified: Some(true),
            name: None,
            picture: None,
        };
        assert_eq!(profile_from_userinfo(info).unwrap().name, "ann");
    }
}
