//! Social card images.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::error::AppError;
use crate::filters::format_long_date;
use crate::middleware::CspNonce;
use crate::models::is_valid_handle;
use crate::og::{CardKind, OgCard};
use crate::routes::{not_found_page, page_error};
use crate::shopify::CollectionSort;
use crate::state::AppState;

/// Render the 1200×630 social card for a product, collection or article.
#[instrument(skip(state, nonce))]
pub async fn card(
    State(state): State<AppState>,
    Path((kind, handle)): Path<(String, String)>,
    nonce: CspNonce,
) -> Response {
    let handle = handle.trim_end_matches(".svg");
    let Some(kind) = CardKind::parse(&kind).filter(|_| is_valid_handle(handle)) else {
        return not_found_page(&state, &nonce);
    };

    let storefront = state.storefront();
    let content = match kind {
        CardKind::Product => storefront
            .get_product_by_handle(handle)
            .await
            .map(|p| (p.title.clone(), p.price_display())),
        CardKind::Collection => storefront
            .get_collection_by_handle(handle, CollectionSort::default())
            .await
            .map(|c| (c.title, "Collection".to_string())),
        CardKind::Article => storefront
            .get_article_by_handle(storefront.blog_handle(), handle)
            .await
            .map(|a| (a.title, format_long_date(&a.published_at))),
    };

    let (title, subtitle) = match content {
        Ok(content) => content,
        Err(e) => return page_error(&state, &nonce, &e),
    };

    let card = OgCard {
        kind,
        title,
        subtitle,
        site_name: state.config().site_name.clone(),
    };
    let svg = match card.render_svg() {
        Ok(svg) => svg,
        Err(e) => return AppError::from(e).into_response(),
    };

    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        svg,
    )
        .into_response()
}
