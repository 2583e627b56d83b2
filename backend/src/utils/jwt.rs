//! JWT token utilities for authentication.
//!
//! Access and refresh tokens carry the same claims but are signed with
//! distinct secrets, so a token minted for one surface never validates on
//! the other.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access tokens live for 15 minutes.
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
/// Refresh tokens (and their session cache entries) live for 7 days.
pub const REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing secret is not configured: {0}")]
    MissingSecret(&'static str),
    #[error("access and refresh tokens must use distinct secrets")]
    SharedSecret,
    #[error("token expired")]
    Expired,
    #[error("token invalid: {0}")]
    Invalid(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Unique per token, so two sessions issued in the same second differ.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly minted access/refresh pair for one user.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Mints and validates access and refresh tokens.
pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenIssuer {
    /// Builds an issuer from the two secrets, failing closed when either is unusable.
    pub fn new(access_secret: &str, refresh_secret: &str) -> Result<Self, TokenError> {
        if access_secret.is_empty() {
            return Err(TokenError::MissingSecret("ACCESS_TOKEN_SECRET"));
        }
        if refresh_secret.is_empty() {
            return Err(TokenError::MissingSecret("REFRESH_TOKEN_SECRET"));
        }
        if access_secret == refresh_secret {
            return Err(TokenError::SharedSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(TokenIssuer {
            access: SigningKeys::from_secret(access_secret),
            refresh: SigningKeys::from_secret(refresh_secret),
            validation,
        })
    }

    /// Issue an access/refresh pair for `user_id` as of now.
    pub fn issue(&self, user_id: &str) -> Result<TokenPair, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue an access/refresh pair as of `now`.
    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.access_token_at(user_id, now)?,
            refresh_token: Self::sign(
                &self.refresh,
                user_id,
                now,
                Duration::seconds(REFRESH_TOKEN_TTL_SECONDS),
            )?,
        })
    }

    /// Issue only an access token, used by the refresh endpoint.
    pub fn access_token(&self, user_id: &str) -> Result<String, TokenError> {
        self.access_token_at(user_id, Utc::now())
    }

    fn access_token_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        Self::sign(
            &self.access,
            user_id,
            now,
            Duration::seconds(ACCESS_TOKEN_TTL_SECONDS),
        )
    }

    /// Validate and decode an access token.
    pub fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(&self.access, token)
    }

    /// Validate and decode a refresh token. Does not consult the session cache.
    pub fn validate_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(&self.refresh, token)
    }

    fn sign(
        keys: &SigningKeys,
        user_id: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        if user_id.is_empty() {
            return Err(TokenError::Signing("empty user id".to_string()));
        }

        let claims = Claims {
            user_id: user_id.to_string(),
            jti: Uuid::now_v7().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, keys: &SigningKeys, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &keys.decoding, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?;

        if claims.user_id.is_empty() {
            return Err(TokenError::Invalid("missing userId claim".to_string()));
        }
        Ok(claims)
    }
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("access-secret", "refresh-secret").unwrap()
    }

    #[test]
    fn tokens_decode_under_their_own_secret_only() {
        let issuer = issuer();
        let pair = issuer.issue("user-1").unwrap();

        let access = issuer.validate_access(&pair.access_token).unwrap();
        assert_eq!(access.user_id(), "user-1");
        let refresh = issuer.validate_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.user_id(), "user-1");

        assert!(matches!(
            issuer.validate_access(&pair.refresh_token),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            issuer.validate_refresh(&pair.access_token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn lifetimes_match_cookie_ttls() {
        let issuer = issuer();
        let now = Utc::now();
        let pair = issuer.issue_at("user-1", now).unwrap();

        let access = issuer.validate_access(&pair.access_token).unwrap();
        assert_eq!(access.exp - access.iat, ACCESS_TOKEN_TTL_SECONDS);
        let refresh = issuer.validate_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.exp - refresh.iat, REFRESH_TOKEN_TTL_SECONDS);
    }

    #[test]
    fn expired_tokens_are_distinguished_from_invalid() {
        let issuer = issuer();
        let issued = Utc::now() - Duration::minutes(16);
        let pair = issuer.issue_at("user-1", issued).unwrap();

        assert_eq!(
            issuer.validate_access(&pair.access_token),
            Err(TokenError::Expired)
        );
        // The refresh token from the same instant is still inside its window.
        assert!(issuer.validate_refresh(&pair.refresh_token).is_ok());

        assert!(matches!(
            issuer.validate_access("not-a-jwt"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let issuer = issuer();
        let pair = issuer.issue("user-1").unwrap();
        let mut tampered = pair.access_token.clone();
        tampered.push('x');

        assert!(matches!(
            issuer.validate_access(&tampered),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn same_second_sessions_are_distinct() {
        let issuer = issuer();
        let now = Utc::now();
        let first = issuer.issue_at("user-1", now).unwrap();
        let second = issuer.issue_at("user-1", now).unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn issuer_fails_closed_without_secrets() {
        assert_eq!(
            TokenIssuer::new("", "refresh").err(),
            Some(TokenError::MissingSecret("ACCESS_TOKEN_SECRET"))
        );
        assert_eq!(
            TokenIssuer::new("access", "").err(),
            Some(TokenError::MissingSecret("REFRESH_TOKEN_SECRET"))
        );
        assert_eq!(
            TokenIssuer::new("same", "same").err(),
            Some(TokenError::SharedSecret)
        );
    }

    #[test]
    fn empty_user_id_is_never_signed() {
        assert!(matches!(issuer().issue(""), Err(TokenError::Signing(_))));
    }
}
