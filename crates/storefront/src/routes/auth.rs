//! Customer authentication API.
//!
//! Login, registration and logout via platform customer access tokens.
//! The token is carried in HttpOnly cookies, never in the session store.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sporeline_core::Email;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{CustomerCookies, append_set_cookies, login_cookies, logout_cookies};
use crate::shopify::{Customer, CustomerCreateInput, ShopifyError};
use crate::state::AppState;

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LEN: usize = 8;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub accepts_marketing: bool,
}

/// Customer fields exposed to page scripts.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            email: customer.email.clone(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            display_name: Some(customer.display_name.clone()),
        }
    }
}

impl CustomerSummary {
    fn from_email(email: &Email) -> Self {
        Self {
            email: Some(email.as_str().to_string()),
            first_name: None,
            last_name: None,
            display_name: None,
        }
    }
}

/// Authentication state response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
}

impl SessionResponse {
    const fn anonymous() -> Self {
        Self {
            authenticated: false,
            customer: None,
        }
    }
}

fn parse_email(input: &str) -> Result<Email> {
    Email::parse(input.trim()).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Exchange credentials for a token and build the login response.
async fn log_in(
    state: &AppState,
    email: &Email,
    password: &SecretString,
    status: StatusCode,
) -> Result<Response> {
    let token = state
        .storefront()
        .create_customer_access_token(email.as_str(), password.expose_secret())
        .await
        .map_err(|e| match e {
            ShopifyError::UserError(msg) => AppError::Unauthorized(msg),
            other => AppError::Shopify(other),
        })?;

    let config = state.config();
    let cookies = login_cookies(
        &config.auth_cookies,
        &token,
        email.as_str(),
        config.is_secure(),
        Utc::now(),
    );

    tracing::info!(email_domain = email.domain(), "Customer logged in");

    let mut response = (
        status,
        Json(SessionResponse {
            authenticated: true,
            customer: Some(CustomerSummary::from_email(email)),
        }),
    )
        .into_response();
    append_set_cookies(response.headers_mut(), &cookies);
    Ok(response)
}

/// Log in with email and password.
#[instrument(skip(state, request))]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Response> {
    let email = parse_email(&request.email)?;
    let password = SecretString::from(request.password);
    if password.expose_secret().is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }
    log_in(&state, &email, &password, StatusCode::OK).await
}

/// Register a customer and log them in.
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response> {
    let email = parse_email(&request.email)?;
    let password = SecretString::from(request.password);
    if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let trimmed = |name: Option<String>| {
        name.map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
    };
    let customer_id = state
        .storefront()
        .create_customer(CustomerCreateInput {
            email: email.as_str().to_string(),
            password: password.expose_secret().to_string(),
            first_name: trimmed(request.first_name),
            last_name: trimmed(request.last_name),
            accepts_marketing: request.accepts_marketing,
        })
        .await
        .map_err(|e| match e {
            ShopifyError::UserError(msg) => AppError::BadRequest(msg),
            other => AppError::Shopify(other),
        })?;

    tracing::info!(customer_id = %customer_id, "Customer registered");
    log_in(&state, &email, &password, StatusCode::CREATED).await
}

/// Log out: revoke the token when possible and always clear the cookies.
#[instrument(skip(state, cookies))]
pub async fn logout(State(state): State<AppState>, cookies: CustomerCookies) -> Response {
    if let Some(token) = &cookies.access_token
        && let Err(e) = state
            .storefront()
            .delete_customer_access_token(token.expose_secret())
            .await
    {
        tracing::warn!(error = %e, "Failed to revoke customer access token");
    }

    clear_sentry_user();

    let config = state.config();
    let mut response = Json(SessionResponse::anonymous()).into_response();
    append_set_cookies(
        response.headers_mut(),
        &logout_cookies(&config.auth_cookies, config.is_secure()),
    );
    response
}

/// Current authentication state.
#[instrument(skip(state, cookies))]
pub async fn session(State(state): State<AppState>, cookies: CustomerCookies) -> Result<Response> {
    let config = state.config();
    let clear = |mut response: Response| {
        append_set_cookies(
            response.headers_mut(),
            &logout_cookies(&config.auth_cookies, config.is_secure()),
        );
        response
    };

    let Some(token) = cookies.access_token.as_ref() else {
        return Ok(Json(SessionResponse::anonymous()).into_response());
    };
    if !cookies.has_live_token(Utc::now()) {
        return Ok(clear(Json(SessionResponse::anonymous()).into_response()));
    }

    match state.storefront().get_customer(token.expose_secret()).await? {
        Some(customer) => {
            set_sentry_user(&customer.id, customer.email.as_deref());
            Ok(Json(SessionResponse {
                authenticated: true,
                customer: Some(CustomerSummary::from(&customer)),
            })
            .into_response())
        }
        None => Ok(clear(Json(SessionResponse::anonymous()).into_response())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::{
        body_json, get, json_request, set_cookies, test_app, test_app_with_upstream,
    };
    use crate::test_support::{UpstreamReply, spawn_upstream};

    const AUTH_COOKIES: [&str; 4] = [
        "customer_access_token=",
        "customer_token_expires_at=",
        "customer_email=",
        "customer_logged_in=",
    ];

    fn login_request() -> axum::http::Request<axum::body::Body> {
        json_request(
            "POST",
            "/api/auth/login",
            &json!({ "email": "grower@example.com", "password": "spores123" }),
        )
    }

    fn auth_cookies(response: &Response) -> Vec<String> {
        set_cookies(response)
            .into_iter()
            .filter(|c| AUTH_COOKIES.iter().any(|name| c.starts_with(name)))
            .collect()
    }

    #[tokio::test]
    async fn test_logout_clears_cookies_when_upstream_fails() {
        let (app, _) = test_app();
        let mut request = json_request("POST", "/api/auth/logout", &json!({}));
        request.headers_mut().insert(
            header::COOKIE,
            "customer_access_token=abc; customer_logged_in=true".parse().unwrap(),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cleared: Vec<&str> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .filter(|v| v.contains("Max-Age=0"))
            .collect();
        assert_eq!(cleared.len(), 4);
        assert!(cleared.iter().any(|c| c.starts_with("customer_access_token=")));
        assert!(cleared.iter().any(|c| c.starts_with("customer_logged_in=")));
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_email() {
        let (app, _) = test_app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                &json!({ "email": "not-an-email", "password": "spores123" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let (app, _) = test_app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                &json!({ "email": "grower@example.com", "password": "short" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_without_cookies_is_anonymous() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/api/auth/session")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_json(response).await, json!({ "authenticated": false }));
    }

    #[tokio::test]
    async fn test_session_with_expired_token_clears_cookies() {
        let (app, _) = test_app();
        let mut request = get("/api/auth/session");
        request.headers_mut().insert(
            header::COOKIE,
            "customer_access_token=abc; customer_token_expires_at=2020-01-01T00:00:00Z"
                .parse()
                .unwrap(),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 4);
    }

    #[tokio::test]
    async fn test_login_sets_all_cookies() {
        let base = spawn_upstream(|request| {
            assert_eq!(request.operation(), "CustomerAccessTokenCreate");
            assert_eq!(request.body["variables"]["input"]["email"], "grower@example.com");
            UpstreamReply::data(json!({
                "customerAccessTokenCreate": {
                    "customerAccessToken": {
                        "accessToken": "tok_123",
                        "expiresAt": "2099-01-01T00:00:00Z"
                    },
                    "customerUserErrors": []
                }
            }))
        })
        .await;
        let (app, _) = test_app_with_upstream(&base);

        let response = app.oneshot(login_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookies = auth_cookies(&response);
        assert_eq!(cookies.len(), 4);
        for name in AUTH_COOKIES {
            let cookie = cookies.iter().find(|c| c.starts_with(name)).unwrap();
            assert!(!cookie.contains("Max-Age=0"), "{cookie}");
        }
        assert!(cookies.iter().any(|c| c.starts_with("customer_access_token=tok_123")));

        let json = body_json(response).await;
        assert_eq!(json["authenticated"], true);
        assert_eq!(json["customer"]["email"], "grower@example.com");
    }

    #[tokio::test]
    async fn test_login_rejected_credentials_unauthorized() {
        let base = spawn_upstream(|_| {
            UpstreamReply::data(json!({
                "customerAccessTokenCreate": {
                    "customerAccessToken": null,
                    "customerUserErrors": [
                        { "field": ["input"], "message": "Unidentified customer" }
                    ]
                }
            }))
        })
        .await;
        let (app, _) = test_app_with_upstream(&base);

        let response = app.oneshot(login_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(auth_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_cookies_after_graphql_error() {
        let base = spawn_upstream(|request| {
            assert_eq!(request.operation(), "CustomerAccessTokenDelete");
            UpstreamReply::json(json!({ "errors": [{ "message": "Access denied" }] }))
        })
        .await;
        let (app, _) = test_app_with_upstream(&base);

        let mut request = json_request("POST", "/api/auth/logout", &json!({}));
        request.headers_mut().insert(
            header::COOKIE,
            "customer_access_token=abc; customer_logged_in=true".parse().unwrap(),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookies = auth_cookies(&response);
        assert_eq!(cookies.len(), 4);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        assert_eq!(body_json(response).await["authenticated"], false);
    }
}
