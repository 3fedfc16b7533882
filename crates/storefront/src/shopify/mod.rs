//! Shopify Storefront API client.
//!
//! The platform is the source of truth for catalog, content, carts and
//! customers. There is no local sync: every read goes to the API, with a
//! short-lived `moka` cache in front of catalog and content queries.
//!
//! # Example
//!
//! ```rust,ignore
//! use sporeline_storefront::shopify::{CartLineInput, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.shopify);
//! let product = client.get_product_by_handle("oyster-grow-kit").await?;
//! let cart = client
//!     .create_cart(vec![CartLineInput {
//!         merchandise_id: product.variants[0].id.clone(),
//!         quantity: 1,
//!     }])
//!     .await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the Storefront API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Mutation rejected the input (`userErrors`).
    #[error("User error: {0}")]
    UserError(String),
}

impl ShopifyError {
    /// Build a single-message GraphQL error.
    pub(crate) fn message(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }])
    }

    /// Whether the error means the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A GraphQL error returned by the API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl std::fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        if !self.message.is_empty() {
            parts.push(self.message.clone());
        }

        if !self.path.is_empty() {
            let path = self
                .path
                .iter()
                .map(|segment| match segment {
                    serde_json::Value::String(key) => key.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".");
            parts.push(format!("path: {path}"));
        }

        if let Some(loc) = self.locations.first() {
            parts.push(format!("at line {}:{}", loc.line, loc.column));
        }

        f.write_str(&parts.join(" "))
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let rendered = e.to_string();
            if rendered.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                rendered
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ShopifyError::NotFound("Product not found: lions-mane-kit".to_string());
        assert_eq!(err.to_string(), "Not found: Product not found: lions-mane-kit");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_multiple_errors_joined() {
        let err = ShopifyError::GraphQL(vec![
            GraphQLError {
                message: "Field 'foo' doesn't exist".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid global id".to_string(),
                locations: vec![],
                path: vec![],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field 'foo' doesn't exist; Invalid global id"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_path_and_location_without_message() {
        let err = ShopifyError::GraphQL(vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 3, column: 7 }],
            path: vec![
                serde_json::Value::String("collection".to_string()),
                serde_json::Value::String("products".to_string()),
                serde_json::Value::Number(2.into()),
            ],
        }]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: collection.products.2 at line 3:7"
        );
    }

    #[test]
    fn test_empty_errors() {
        let blank = ShopifyError::GraphQL(vec![GraphQLError {
            message: String::new(),
            locations: vec![],
            path: vec![],
        }]);
        assert_eq!(blank.to_string(), "GraphQL errors: [error 1]: (no details)");
        assert_eq!(
            ShopifyError::GraphQL(vec![]).to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_message_helper_and_rate_limit() {
        assert_eq!(
            ShopifyError::message("No data in response").to_string(),
            "GraphQL errors: No data in response"
        );
        assert_eq!(
            ShopifyError::RateLimited(2).to_string(),
            "Rate limited, retry after 2 seconds"
        );
    }
}
