//! Customer authentication cookies.
//!
//! A logged-in customer is carried by four cookies named in
//! [`AuthCookieConfig`]. The access token itself never leaves HttpOnly
//! cookies; page scripts only see the `logged_in` flag.

use std::time::Duration;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tower_sessions::cookie::{Cookie, SameSite, time};

use crate::config::{AuthCookieConfig, CookieSpec};
use crate::shopify::CustomerAccessToken;
use crate::state::AppState;

/// Value of the `logged_in` cookie.
const LOGGED_IN_VALUE: &str = "true";

/// Auth cookies as sent by the browser.
///
/// Extraction never fails; absent cookies are `None`.
#[derive(Debug, Default)]
pub struct CustomerCookies {
    pub access_token: Option<SecretString>,
    pub expires_at: Option<String>,
    pub email: Option<String>,
}

impl CustomerCookies {
    /// Read the auth cookies from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, config: &AuthCookieConfig) -> Self {
        let mut cookies = Self::default();
        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for cookie in Cookie::split_parse(value).filter_map(Result::ok) {
                let name = cookie.name();
                let value = cookie.value();
                if value.is_empty() {
                    continue;
                }
                if name == config.access_token.name {
                    cookies.access_token = Some(SecretString::from(value.to_string()));
                } else if name == config.expires_at.name {
                    cookies.expires_at = Some(value.to_string());
                } else if name == config.customer_email.name {
                    cookies.email = Some(value.to_string());
                }
            }
        }
        cookies
    }

    /// Whether the token cookie is present and not past its recorded expiry.
    #[must_use]
    pub fn has_live_token(&self, now: DateTime<Utc>) -> bool {
        self.access_token.is_some()
            && self
                .expires_at
                .as_deref()
                .and_then(|e| DateTime::parse_from_rfc3339(e).ok())
                .is_none_or(|expires| expires > now)
    }
}

impl FromRequestParts<AppState> for CustomerCookies {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, &state.config().auth_cookies))
    }
}

fn build_cookie(spec: &CookieSpec, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((spec.name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(spec.http_only)
        .secure(secure)
        .max_age(time::Duration::seconds(
            i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX),
        ))
        .build()
}

/// Lifetime of the token cookie: the configured TTL, capped at the token's
/// remaining lifetime.
#[must_use]
pub fn token_cookie_max_age(ttl: Duration, expires_at: &str, now: DateTime<Utc>) -> Duration {
    DateTime::parse_from_rfc3339(expires_at)
        .ok()
        .and_then(|expires| (expires.with_timezone(&Utc) - now).to_std().ok())
        .map_or(ttl, |remaining| remaining.min(ttl))
}

/// The four cookies for a freshly logged-in customer.
#[must_use]
pub fn login_cookies(
    config: &AuthCookieConfig,
    token: &CustomerAccessToken,
    email: &str,
    secure: bool,
    now: DateTime<Utc>,
) -> Vec<Cookie<'static>> {
    let token_max_age = token_cookie_max_age(config.access_token.max_age, &token.expires_at, now);
    vec![
        build_cookie(
            &config.access_token,
            token.access_token.clone(),
            token_max_age,
            secure,
        ),
        build_cookie(
            &config.expires_at,
            token.expires_at.clone(),
            config.expires_at.max_age,
            secure,
        ),
        build_cookie(
            &config.customer_email,
            email.to_string(),
            config.customer_email.max_age,
            secure,
        ),
        build_cookie(
            &config.logged_in,
            LOGGED_IN_VALUE.to_string(),
            config.logged_in.max_age,
            secure,
        ),
    ]
}

/// Cookies that delete all four auth cookies (`Max-Age=0`).
#[must_use]
pub fn logout_cookies(config: &AuthCookieConfig, secure: bool) -> Vec<Cookie<'static>> {
    config
        .all()
        .into_iter()
        .map(|spec| build_cookie(spec, String::new(), Duration::ZERO, secure))
        .collect()
}

/// Append cookies as `Set-Cookie` headers.
pub fn append_set_cookies(headers: &mut HeaderMap, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            headers.append(header::SET_COOKIE, value);
        } else {
            tracing::warn!(cookie = cookie.name(), "Cookie value is not a valid header");
        }
    }
}
