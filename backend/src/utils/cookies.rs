//! Cookie helpers for the session token pair.
//!
//! Every entry point that establishes or clears a session goes through these
//! builders so names, lifetimes and attributes stay identical everywhere.

use crate::errors::{ServiceError, ServiceResult};
use crate::utils::jwt::{ACCESS_TOKEN_TTL_SECONDS, REFRESH_TOKEN_TTL_SECONDS, TokenPair};
use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, SET_COOKIE},
};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const OAUTH_STATE_COOKIE: &str = "oauthState";

/// The OAuth state only has to survive the round trip to the provider.
pub const OAUTH_STATE_TTL_SECONDS: i64 = 10 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SameSite {
    Strict,
    // The provider redirect back to us is a cross-site navigation.
    Lax,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
        }
    }
}

fn build_cookie(
    name: &str,
    value: &str,
    max_age: i64,
    same_site: SameSite,
    secure: bool,
) -> ServiceResult<HeaderValue> {
    let mut cookie = format!(
        "{name}={value}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age}",
        same_site.as_str()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| ServiceError::internal_error(format!("Invalid cookie value: {e}")))
}

/// `Set-Cookie` for the short-lived access token.
pub fn access_cookie(token: &str, secure: bool) -> ServiceResult<HeaderValue> {
    build_cookie(
        ACCESS_TOKEN_COOKIE,
        token,
        ACCESS_TOKEN_TTL_SECONDS,
        SameSite::Strict,
        secure,
    )
}

/// `Set-Cookie` for the long-lived refresh token.
pub fn refresh_cookie(token: &str, secure: bool) -> ServiceResult<HeaderValue> {
    build_cookie(
        REFRESH_TOKEN_COOKIE,
        token,
        REFRESH_TOKEN_TTL_SECONDS,
        SameSite::Strict,
        secure,
    )
}

/// Both session cookies for a freshly established session.
pub fn session_cookies(tokens: &TokenPair, secure: bool) -> ServiceResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, access_cookie(&tokens.access_token, secure)?);
    headers.append(SET_COOKIE, refresh_cookie(&tokens.refresh_token, secure)?);
    Ok(headers)
}

/// `Set-Cookie` headers that expire both session cookies.
pub fn clear_session_cookies(secure: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
        if let Ok(cookie) = build_cookie(name, "", 0, SameSite::Strict, secure) {
            headers.append(SET_COOKIE, cookie);
        }
    }
    headers
}

pub fn oauth_state_cookie(state: &str, secure: bool) -> ServiceResult<HeaderValue> {
    build_cookie(
        OAUTH_STATE_COOKIE,
        state,
        OAUTH_STATE_TTL_SECONDS,
        SameSite::Lax,
        secure,
    )
}

pub fn clear_oauth_state_cookie(secure: bool) -> ServiceResult<HeaderValue> {
    build_cookie(OAUTH_STATE_COOKIE, "", 0, SameSite::Lax, secure)
}

/// Reads a cookie value from the request headers. Empty values count as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next()?.trim();
            let val = parts.next()?.trim();
            (key == name && !val.is_empty()).then(|| val.to_string())
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_cookies(headers: &HeaderMap) -> Vec<String> {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn session_cookies_carry_matching_lifetimes() {
        let tokens = TokenPair {
            access_token: "aaa".into(),
            refresh_token: "rrr".into(),
        };
        let cookies = set_cookies(&session_cookies(&tokens, false).unwrap());

        assert_eq!(
            cookies,
            vec![
                "accessToken=aaa; Path=/; HttpOnly; SameSite=Strict; Max-Age=900".to_string(),
                "refreshToken=rrr; Path=/; HttpOnly; SameSite=Strict; Max-Age=604800".to_string(),
            ]
        );
    }

    #[test]
    fn production_cookies_are_secure() {
        let cookie = access_cookie("aaa", true).unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn clearing_expires_both_cookies() {
        let cookies = set_cookies(&clear_session_cookies(false));
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("accessToken=;"));
        assert!(cookies[1].starts_with("refreshToken=;"));
        assert!(cookies.iter().all(|cookie| cookie.contains("Max-Age=0")));
    }

    #[test]
    fn oauth_state_survives_cross_site_redirect() {
        let cookie = oauth_state_cookie("state", false).unwrap();
        assert!(cookie.to_str().unwrap().contains("SameSite=Lax"));
    }

    #[test]
    fn reads_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=abc.def; refreshToken="),
        );

        assert_eq!(
            read_cookie(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc.def")
        );
        assert_eq!(read_cookie(&headers, REFRESH_TOKEN_COOKIE), None);
        assert_eq!(read_cookie(&headers, "missing"), None);
    }
}
