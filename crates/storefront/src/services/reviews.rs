//! Product reviews API client.
//!
//! Proxies the third-party reviews provider so its token never reaches the
//! browser. Product ids are normalised from storefront global ids to the bare
//! numeric ids the provider indexes by.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sporeline_core::{Email, ShopifyGid};
use thiserror::Error;
use tracing::instrument;

use crate::config::ReviewsConfig;

/// Largest page the provider serves.
const MAX_PER_PAGE: u32 = 50;
const DEFAULT_PER_PAGE: u32 = 10;

/// Errors that can occur when interacting with the reviews API.
#[derive(Debug, Error)]
pub enum ReviewsError {
    /// No reviews token configured.
    #[error("reviews API is not configured")]
    NotConfigured,

    /// Product id is neither a product global id nor numeric.
    #[error("invalid product id: {0}")]
    InvalidProductId(String),

    /// Submitted review failed validation.
    #[error("invalid review: {0}")]
    Validation(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Normalise a product identifier for the reviews API.
///
/// # Errors
///
/// Returns `InvalidProductId` for anything that isn't a product global id or
/// a bare numeric id.
pub fn normalize_product_id(input: &str) -> Result<String, ReviewsError> {
    ShopifyGid::numeric_product_id(input)
        .map_err(|_| ReviewsError::InvalidProductId(input.trim().to_string()))
}

/// Reviewer as returned by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reviewer {
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// A published review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Provider review id.
    pub id: i64,
    /// Star rating, 1 to 5.
    pub rating: u8,
    /// Optional headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Review text.
    #[serde(default)]
    pub body: String,
    /// Reviewer.
    #[serde(default)]
    pub reviewer: Reviewer,
    /// Whether the purchase was verified.
    #[serde(default)]
    pub verified: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Aggregate rating over a page of reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    /// Mean rating, rounded to one decimal (0 when there are no reviews).
    pub average_rating: f64,
    /// Number of reviews.
    pub count: usize,
}

impl ReviewSummary {
    /// Summarise a set of reviews.
    #[must_use]
    pub fn from_reviews(reviews: &[Review], total: Option<usize>) -> Self {
        if reviews.is_empty() {
            return Self {
                average_rating: 0.0,
                count: total.unwrap_or(0),
            };
        }

        let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        #[allow(clippy::cast_precision_loss)] // page sizes are tiny
        let average = f64::from(sum) / reviews.len() as f64;

        Self {
            average_rating: (average * 10.0).round() / 10.0,
            count: total.unwrap_or(reviews.len()),
        }
    }
}

/// Reviews for one product page plus the summary.
#[derive(Debug, Clone, Serialize)]
pub struct ProductReviews {
    /// Numeric product id.
    pub product_id: String,
    /// Current page (1-based).
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Reviews on this page.
    pub reviews: Vec<Review>,
    /// Aggregate rating.
    pub summary: ReviewSummary,
}

#[derive(Debug, Deserialize)]
struct ReviewsPage {
    #[serde(default)]
    reviews: Vec<Review>,
    #[serde(default)]
    total: Option<usize>,
}

/// A review submitted from the product page.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    /// Product global id or numeric id.
    pub product_id: String,
    /// Star rating, 1 to 5.
    pub rating: u8,
    /// Reviewer name.
    pub name: String,
    /// Reviewer email.
    pub email: String,
    /// Optional headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Review text.
    pub body: String,
}

/// A `NewReview` that passed validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedReview {
    product_id: String,
    rating: u8,
    name: String,
    email: Email,
    title: Option<String>,
    body: String,
}

impl NewReview {
    /// Check the submission and normalise the product id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProductId` or `Validation` describing the first
    /// problem found.
    pub fn validate(self) -> Result<ValidatedReview, ReviewsError> {
        let product_id = normalize_product_id(&self.product_id)?;

        if !(1..=5).contains(&self.rating) {
            return Err(ReviewsError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(ReviewsError::Validation("name is required".to_string()));
        }

        let body = self.body.trim();
        if body.is_empty() {
            return Err(ReviewsError::Validation("review text is required".to_string()));
        }

        let email = Email::parse(&self.email)
            .map_err(|e| ReviewsError::Validation(e.to_string()))?;

        Ok(ValidatedReview {
            product_id,
            rating: self.rating,
            name: name.to_string(),
            email,
            title: self
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            body: body.to_string(),
        })
    }
}

/// Reviews API client.
#[derive(Clone)]
pub struct ReviewsClient {
    inner: Arc<ReviewsClientInner>,
}

struct ReviewsClientInner {
    client: reqwest::Client,
    api_url: String,
    shop_domain: String,
}

impl ReviewsClient {
    /// Create a new reviews API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ReviewsConfig) -> Result<Self, ReviewsError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ReviewsError::Parse(format!("Invalid API token format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(ReviewsClientInner {
                client,
                api_url: config.api_url.clone(),
                shop_domain: config.shop_domain.clone(),
            }),
        })
    }

    /// Fetch a page of published reviews for a product.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProductId` for malformed ids, or an error if the API
    /// request fails.
    #[instrument(skip(self))]
    pub async fn product_reviews(
        &self,
        product_id: &str,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<ProductReviews, ReviewsError> {
        let product_id = normalize_product_id(product_id)?;
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

        let url = format!("{}/reviews", self.inner.api_url);
        let response = self
            .inner
            .client
            .get(&url)
            .query(&[
                ("shop_domain", self.inner.shop_domain.as_str()),
                ("product_id", product_id.as_str()),
            ])
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReviewsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ReviewsPage = response
            .json()
            .await
            .map_err(|e| ReviewsError::Parse(e.to_string()))?;

        let summary = ReviewSummary::from_reviews(&body.reviews, body.total);

        Ok(ProductReviews {
            product_id,
            page,
            per_page,
            reviews: body.reviews,
            summary,
        })
    }

    /// Submit a review. The provider moderates it before publishing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, review), fields(product_id = %review.product_id))]
    pub async fn create_review(&self, review: &ValidatedReview) -> Result<(), ReviewsError> {
        let url = format!("{}/reviews", self.inner.api_url);

        let body = serde_json::json!({
            "shop_domain": self.inner.shop_domain,
            "platform": "shopify",
            "id": review.product_id,
            "name": review.name,
            "email": review.email,
            "rating": review.rating,
            "title": review.title,
            "body": review.body,
        });

        let response = self.inner.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReviewsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("Review submitted for moderation");
        Ok(())
    }
}
