//! RSS, sitemaps and robots.txt.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::error::AppError;
use crate::feeds::{FeedSite, RSS_ARTICLE_LIMIT, image_sitemap, robots_txt, rss_feed, sitemap};
use crate::shopify::Collection;
use crate::state::AppState;

/// Collections listed in the sitemap.
const SITEMAP_COLLECTIONS_LIMIT: i64 = 250;

const RSS_DESCRIPTION: &str = "Growing notes, techniques and news from the lab.";

fn xml_response(content_type: &'static str, body: askama::Result<String>) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(e) => return AppError::from(e).into_response(),
    };
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        body,
    )
        .into_response()
}

/// RSS feed of the newest blog articles.
#[instrument(skip(state))]
pub async fn rss(State(state): State<AppState>) -> Response {
    let articles = match state.storefront().get_articles(RSS_ARTICLE_LIMIT).await {
        Ok(articles) => articles,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load articles for RSS");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let config = state.config();
    let body = rss_feed(
        FeedSite {
            base_url: &config.base_url,
            name: &config.site_name,
            description: RSS_DESCRIPTION,
        },
        &articles,
    );
    xml_response("application/rss+xml; charset=utf-8", body)
}

/// Sitemap of every public page.
///
/// Sections whose source is unavailable are left out rather than failing
/// the whole sitemap.
#[instrument(skip(state))]
pub async fn sitemap_xml(State(state): State<AppState>) -> Response {
    let storefront = state.storefront();
    let (catalog, collections, articles) = tokio::join!(
        state.search().catalog(),
        storefront.get_collections(SITEMAP_COLLECTIONS_LIMIT, None),
        storefront.get_articles(RSS_ARTICLE_LIMIT),
    );

    let collections: Vec<Collection> = collections
        .map(|c| c.collections)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Sitemap without collections");
            Vec::new()
        });
    let articles = articles.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Sitemap without articles");
        Vec::new()
    });

    let body = sitemap(&state.config().base_url, &catalog, &collections, &articles);
    xml_response("application/xml; charset=utf-8", body)
}

/// Image sitemap for product photos.
#[instrument(skip(state))]
pub async fn image_sitemap_xml(State(state): State<AppState>) -> Response {
    let catalog = state.search().catalog().await;
    let body = image_sitemap(&state.config().base_url, &catalog);
    xml_response("application/xml; charset=utf-8", body)
}

/// Crawler rules.
pub async fn robots(State(state): State<AppState>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        robots_txt(&state.config().base_url),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::{body_string, get, test_app};
    use crate::test_support::product;

    #[tokio::test]
    async fn test_robots() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/robots.txt")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        let body = body_string(response).await;
        assert!(body.contains("Disallow: /api/"));
        assert!(body.contains("sitemap-images.xml"));
    }

    #[tokio::test]
    async fn test_rss_upstream_failure() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/api/feed.xml")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_sitemap_degrades_to_catalog() {
        let (app, state) = test_app();
        state
            .search()
            .prime(vec![product("oyster-kit", "Oyster Grow Kit", "24.00")])
            .await;

        let response = app.oneshot(get("/sitemap.xml")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=3600"
        );
        let body = body_string(response).await;
        assert!(body.contains("/products/oyster-kit</loc>"));
        assert!(!body.contains("/collections/"));
    }

    #[tokio::test]
    async fn test_image_sitemap() {
        let (app, state) = test_app();
        state
            .search()
            .prime(vec![product("agar-plates", "Agar Plates", "12.00")])
            .await;

        let body = body_string(app.oneshot(get("/sitemap-images.xml")).await.unwrap()).await;
        assert!(body.contains("xmlns:image"));
        assert!(body.contains("<image:image>"));
    }
}
