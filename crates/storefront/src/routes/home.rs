//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::Layout;
use crate::routes::blog::ArticleCard;
use crate::routes::collections::CollectionCard;
use crate::routes::products::ProductCard;
use crate::seo::PageMeta;
use crate::shopify::ProductSortKey;
use crate::state::AppState;

const FEATURED_COLLECTIONS: i64 = 6;
const NEW_ARRIVALS: i64 = 8;
const LATEST_ARTICLES: i64 = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub collections: Vec<CollectionCard>,
    pub new_arrivals: Vec<ProductCard>,
    pub articles: Vec<ArticleCard>,
}

/// Display the home page.
///
/// Each section degrades to empty on its own when the Storefront API fails.
#[instrument(skip(state, nonce))]
pub async fn home(State(state): State<AppState>, nonce: CspNonce) -> impl IntoResponse {
    let storefront = state.storefront();
    let (collections, products, articles) = tokio::join!(
        storefront.get_collections(FEATURED_COLLECTIONS, None),
        storefront.get_products(
            NEW_ARRIVALS,
            None,
            None,
            Some(ProductSortKey::CreatedAt),
            Some(true),
        ),
        storefront.get_articles(LATEST_ARTICLES),
    );

    let collections = collections
        .map(|c| c.collections.iter().map(CollectionCard::from).collect())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Home page collections unavailable");
            Vec::new()
        });
    let new_arrivals = products
        .map(|p| p.products.iter().map(ProductCard::from).collect())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Home page products unavailable");
            Vec::new()
        });
    let articles = articles
        .map(|a| a.iter().map(ArticleCard::from).collect())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Home page articles unavailable");
            Vec::new()
        });

    HomeTemplate {
        layout: Layout::new(&state, &nonce, PageMeta::home(state.config())),
        collections,
        new_arrivals,
        articles,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::routes::tests::{body_string, get, test_app};

    #[tokio::test]
    async fn test_home_renders_without_upstream() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Sporeline Mycology Supply"));
        assert!(html.contains("application/ld+json"));
    }
}
