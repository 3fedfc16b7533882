//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built, and clients only ever
//! see a JSON body of the form `{"error": "..."}`.

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::chat::ChatError;
use crate::services::reviews::ReviewsError;
use crate::shopify::ShopifyError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storefront API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Reviews API operation failed.
    #[error("Reviews error: {0}")]
    Reviews(#[from] ReviewsError),

    /// Chat API operation failed.
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// Upstream failure that was already shared between callers.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials rejected or missing.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An optional integration is not configured.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Shopify(err) => match err {
                ShopifyError::NotFound(_) => StatusCode::NOT_FOUND,
                ShopifyError::UserError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ShopifyError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Reviews(err) => match err {
                ReviewsError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                ReviewsError::InvalidProductId(_) | ReviewsError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Chat(err) => match err {
                ChatError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                ChatError::Validation(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Template(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Shopify(ShopifyError::NotFound(_)) | Self::NotFound(_) => "Not found".to_string(),
            Self::Shopify(ShopifyError::UserError(msg)) => msg.clone(),
            Self::Shopify(ShopifyError::RateLimited(_)) => {
                "Store is busy, please try again shortly".to_string()
            }
            Self::Shopify(_) | Self::Reviews(_) | Self::Chat(_)
                if self.status() == StatusCode::BAD_GATEWAY =>
            {
                "External service error".to_string()
            }
            Self::Reviews(ReviewsError::NotConfigured) => "Reviews are unavailable".to_string(),
            Self::Chat(ChatError::NotConfigured) => "Chat is unavailable".to_string(),
            Self::Reviews(ReviewsError::InvalidProductId(id)) => {
                format!("Invalid product id: {id}")
            }
            Self::Reviews(ReviewsError::Validation(msg)) | Self::Chat(ChatError::Validation(msg)) => {
                msg.clone()
            }
            Self::Template(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Upstream(_) => "External service error".to_string(),
            Self::Unauthorized(msg) | Self::BadRequest(msg) | Self::ServiceUnavailable(msg) => {
                msg.clone()
            }
            Self::RateLimited => "Too many requests".to_string(),
            Self::Shopify(_) | Self::Reviews(_) | Self::Chat(_) => "External service error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if status.is_server_error() {
            tracing::warn!(error = %self, "Request error");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<Arc<ShopifyError>> for AppError {
    /// Errors from coalesced loads arrive shared between every waiting caller.
    fn from(err: Arc<ShopifyError>) -> Self {
        let shared = match Arc::try_unwrap(err) {
            Ok(err) => return Self::Shopify(err),
            Err(shared) => shared,
        };
        match shared.as_ref() {
            ShopifyError::NotFound(_) => Self::NotFound(shared.to_string()),
            ShopifyError::RateLimited(retry_after) => {
                Self::Shopify(ShopifyError::RateLimited(*retry_after))
            }
            ShopifyError::UserError(msg) => Self::Shopify(ShopifyError::UserError(msg.clone())),
            _ => Self::Upstream(shared.to_string()),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for a logged-in customer.
pub fn set_sentry_user(customer_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a customer action.
///
/// Breadcrumbs appear in Sentry error reports as the trail of actions leading
/// up to an error.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("variant_id", "gid://...")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
