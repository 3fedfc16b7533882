//! Image prefetch endpoint.

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::is_valid_handle;
use crate::prefetch::{PrefetchImage, PrefetchKind};
use crate::state::AppState;

/// Prefetch query parameters.
#[derive(Debug, Deserialize)]
pub struct PrefetchQuery {
    #[serde(rename = "type")]
    pub kind: String,
    pub handle: String,
}

/// Prefetch response.
#[derive(Debug, Serialize)]
pub struct PrefetchResponse {
    pub images: Vec<PrefetchImage>,
}

/// Images worth warming for a product or collection.
#[instrument(skip(state))]
pub async fn prefetch_images(
    State(state): State<AppState>,
    Query(query): Query<PrefetchQuery>,
) -> Result<impl IntoResponse> {
    let kind = PrefetchKind::parse(&query.kind)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown type: {}", query.kind)))?;
    if !is_valid_handle(&query.handle) {
        return Err(AppError::BadRequest("Invalid handle".to_string()));
    }

    let images = state
        .prefetch()
        .images(state.storefront(), kind, &query.handle)
        .await?;

    Ok((
        [(header::CACHE_CONTROL, "public, max-age=300")],
        Json(PrefetchResponse {
            images: images.as_ref().clone(),
        }),
    ))
}
