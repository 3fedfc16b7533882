//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /products                  - Product listing (?sort=&after=)
//! GET  /products/{handle}         - Product detail
//! GET  /collections               - Collection listing
//! GET  /collections/{handle}      - Collection detail (?sort=&in_stock=1)
//! GET  /search                    - Search page
//! GET  /blog                      - Blog index
//! GET  /blog/{handle}             - Blog article
//! GET  /cart                      - Cart page
//! GET  /checkout                  - Redirect to the platform checkout
//! GET  /wishlist                  - Wishlist page
//! GET  /og/{kind}/{handle}        - Social card (SVG)
//!
//! # Feeds
//! GET  /api/feed.xml              - RSS feed of blog articles
//! GET  /sitemap.xml               - Sitemap
//! GET  /sitemap-images.xml        - Image sitemap
//! GET  /robots.txt                - Robots rules
//!
//! # JSON API (rate limited)
//! GET  /api/search                - Search results
//! GET  /api/search/suggest        - Autocomplete suggestions
//! GET  /api/prefetch-images       - Images to warm for a product or collection
//! GET  /api/analytics/ab-test     - A/B test summary
//! POST /api/analytics/ab-test     - Record an A/B event
//! DEL  /api/analytics/ab-test     - Clear A/B events
//! GET  /api/reviews               - Product reviews
//! POST /api/reviews               - Submit a review
//! POST /api/chat                  - Grow assistant
//! POST /api/auth/login            - Customer login
//! POST /api/auth/register         - Customer registration
//! POST /api/auth/logout           - Customer logout
//! GET  /api/auth/session          - Current customer
//! GET  /api/cart                  - Current cart
//! POST /api/cart/add              - Add a variant
//! POST /api/cart/update           - Change a line quantity
//! POST /api/cart/remove           - Remove a line
//! GET  /api/wishlist              - Wishlist handles
//! POST /api/wishlist              - Add a handle
//! DEL  /api/wishlist/{handle}     - Remove a handle
//! ```

pub mod api;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod collections;
pub mod feeds;
pub mod home;
pub mod og;
pub mod products;
pub mod search;
pub mod wishlist;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use crate::filters;
use crate::middleware::{CspNonce, api_rate_limiter, auth_rate_limiter, chat_rate_limiter};
use crate::seo::{BreadcrumbItem, PageMeta};
use crate::shopify::ShopifyError;
use crate::state::AppState;

/// Data every page layout needs.
#[derive(Clone)]
pub struct Layout {
    pub meta: PageMeta,
    pub site_name: String,
    pub nonce: String,
    pub ga4_measurement_id: Option<String>,
    pub meta_pixel_id: Option<String>,
    pub breadcrumbs: Vec<BreadcrumbItem>,
}

impl Layout {
    /// Build the layout for a page.
    ///
    /// JSON-LD is made safe to inline in a `<script>` element.
    #[must_use]
    pub fn new(state: &AppState, nonce: &CspNonce, mut meta: PageMeta) -> Self {
        for ld in &mut meta.json_ld {
            *ld = ld.replace("</", "<\\/");
        }
        let config = state.config();
        Self {
            meta,
            site_name: config.site_name.clone(),
            nonce: nonce.value().to_string(),
            ga4_measurement_id: config.analytics.ga4_measurement_id.clone(),
            meta_pixel_id: config.analytics.meta_pixel_id.clone(),
            breadcrumbs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_breadcrumbs(mut self, breadcrumbs: Vec<BreadcrumbItem>) -> Self {
        self.breadcrumbs = breadcrumbs;
        self
    }
}

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
}

/// Upstream failure page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/unavailable.html")]
pub struct UnavailableTemplate {
    pub layout: Layout,
}

/// Render the 404 page.
#[must_use]
pub fn not_found_page(state: &AppState, nonce: &CspNonce) -> Response {
    let meta = PageMeta::basic(state.config(), "Page not found", "/");
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            layout: Layout::new(state, nonce, meta),
        },
    )
        .into_response()
}

/// Render a page-level Storefront API failure.
///
/// `NotFound` becomes the 404 page; anything else is reported and shown as
/// a 502 page.
#[must_use]
pub fn page_error(state: &AppState, nonce: &CspNonce, err: &ShopifyError) -> Response {
    if err.is_not_found() {
        return not_found_page(state, nonce);
    }

    let event_id = sentry::capture_error(err);
    tracing::error!(error = %err, sentry_event_id = %event_id, "Page failed to load");

    let meta = PageMeta::basic(state.config(), "Temporarily unavailable", "/");
    (
        StatusCode::BAD_GATEWAY,
        UnavailableTemplate {
            layout: Layout::new(state, nonce, meta),
        },
    )
        .into_response()
}

/// Router fallback.
pub async fn fallback(
    axum::extract::State(state): axum::extract::State<AppState>,
    nonce: CspNonce,
) -> Response {
    not_found_page(&state, &nonce)
}

/// Create the HTML page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products", get(products::index))
        .route("/products/{handle}", get(products::show))
        .route("/collections", get(collections::index))
        .route("/collections/{handle}", get(collections::show))
        .route("/search", get(search::page))
        .route("/blog", get(blog::index))
        .route("/blog/{handle}", get(blog::show))
        .route("/cart", get(cart::show))
        .route("/checkout", get(cart::checkout))
        .route("/wishlist", get(wishlist::show))
        .route("/og/{kind}/{handle}", get(og::card))
}

/// Create the feed routes router.
pub fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/api/feed.xml", get(feeds::rss))
        .route("/sitemap.xml", get(feeds::sitemap_xml))
        .route("/sitemap-images.xml", get(feeds::image_sitemap_xml))
        .route("/robots.txt", get(feeds::robots))
}

/// Create the customer auth API router.
///
/// Login and registration get the strict limiter.
pub fn auth_api_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
        .layer(api_rate_limiter())
        .merge(limited)
}

/// Create the cart API router.
pub fn cart_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::api_show))
        .route("/add", post(cart::api_add))
        .route("/update", post(cart::api_update))
        .route("/remove", post(cart::api_remove))
}

/// Create the wishlist API router.
pub fn wishlist_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::api_show).post(wishlist::api_add))
        .route("/{handle}", delete(wishlist::api_remove))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    let chat = Router::new()
        .route("/chat", post(api::chat::chat))
        .layer(chat_rate_limiter());

    Router::new()
        .route("/search", get(search::api_search))
        .route("/search/suggest", get(search::api_suggest))
        .route("/prefetch-images", get(api::prefetch::prefetch_images))
        .route(
            "/analytics/ab-test",
            get(api::analytics::summary)
                .post(api::analytics::record)
                .delete(api::analytics::clear),
        )
        .route(
            "/reviews",
            get(api::reviews::list).post(api::reviews::create),
        )
        .nest("/cart", cart_api_routes())
        .nest("/wishlist", wishlist_api_routes())
        .layer(api_rate_limiter())
        .merge(chat)
        .nest("/auth", auth_api_routes())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(page_routes())
        .merge(feed_routes())
        .nest("/api", api_routes())
        .fallback(fallback)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::{test_config, test_config_with_upstream};

    /// Full application against an unreachable Storefront API.
    pub fn test_app() -> (Router, AppState) {
        let state = AppState::new(test_config()).unwrap();
        (crate::app(state.clone()), state)
    }

    /// Full application with every upstream served by the stub at `base`.
    pub fn test_app_with_upstream(base: &str) -> (Router, AppState) {
        let state = AppState::new(test_config_with_upstream(base)).unwrap();
        (crate::app(state.clone()), state)
    }

    /// `name=value` of the first `Set-Cookie` header, for replaying a session.
    pub fn session_cookie(response: &Response) -> String {
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    /// `Set-Cookie` headers of a response.
    pub fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10")
            .body(Body::empty())
            .unwrap()
    }

    pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_route_renders_not_found_page() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/no-such-page")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = body_string(response).await;
        assert!(html.contains("Page not found"));
    }

    #[tokio::test]
    async fn test_upstream_failure_renders_unavailable_page() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/products/oyster-grow-kit")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let html = body_string(response).await;
        assert!(html.contains("Temporarily unavailable"));
    }

    #[test]
    fn test_layout_escapes_json_ld() {
        let (_, state) = test_app();
        let mut meta = PageMeta::home(state.config());
        meta.json_ld = vec![r#"{"name":"</script><script>alert(1)"}"#.to_string()];

        let layout = Layout::new(&state, &CspNonce("n".to_string()), meta);
        assert_eq!(
            layout.meta.json_ld[0],
            r#"{"name":"<\/script><script>alert(1)"}"#
        );
        assert_eq!(layout.nonce, "n");
    }
}
