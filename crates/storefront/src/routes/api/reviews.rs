//! Product reviews proxy.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::services::reviews::{NewReview, ProductReviews};
use crate::services::{ReviewsClient, ReviewsError};
use crate::state::AppState;

/// Review listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ReviewsQuery {
    pub product_id: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn client(state: &AppState) -> std::result::Result<&ReviewsClient, ReviewsError> {
    state.reviews().ok_or(ReviewsError::NotConfigured)
}

/// Published reviews for a product.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<ProductReviews>> {
    let reviews = client(&state)?
        .product_reviews(&query.product_id, query.page, query.per_page)
        .await?;
    Ok(Json(reviews))
}

/// Submit a review.
#[instrument(skip(state, review))]
pub async fn create(
    State(state): State<AppState>,
    Json(review): Json<NewReview>,
) -> Result<impl IntoResponse> {
    let client = client(&state)?;
    let review = review.validate()?;
    client.create_review(&review).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "success": true }))))
}
