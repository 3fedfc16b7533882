//! Blog route handlers.
//!
//! Articles come from the platform blog named by `SHOPIFY_BLOG_HANDLE`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::products::ImageView;
use crate::routes::{Layout, page_error};
use crate::seo::{PageMeta, article_breadcrumbs};
use crate::shopify::Article;
use crate::state::AppState;

/// Articles on the blog index.
const BLOG_PAGE_SIZE: i64 = 24;

/// Number of recent articles shown under an article.
const RECENT_ARTICLES_COUNT: usize = 3;

/// Article card for lists.
#[derive(Clone)]
pub struct ArticleCard {
    pub handle: String,
    pub title: String,
    pub summary: String,
    pub published_at: String,
    pub author: Option<String>,
    pub image: Option<ImageView>,
}

impl From<&Article> for ArticleCard {
    fn from(article: &Article) -> Self {
        Self {
            handle: article.handle.clone(),
            title: article.title.clone(),
            summary: article.summary(),
            published_at: article.published_at.clone(),
            author: article.author_name.clone(),
            image: article
                .image
                .as_ref()
                .map(|img| ImageView::from_image(img, &article.title)),
        }
    }
}

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub layout: Layout,
    pub articles: Vec<ArticleCard>,
}

/// Blog article template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub layout: Layout,
    pub article: ArticleCard,
    pub content_html: String,
    pub tags: Vec<String>,
    pub recent: Vec<ArticleCard>,
}

/// Display the blog index.
#[instrument(skip(state, nonce))]
pub async fn index(State(state): State<AppState>, nonce: CspNonce) -> Response {
    match state.storefront().get_articles(BLOG_PAGE_SIZE).await {
        Ok(articles) => BlogIndexTemplate {
            layout: Layout::new(
                &state,
                &nonce,
                PageMeta::basic(state.config(), "Field Notes", "/blog"),
            ),
            articles: articles.iter().map(ArticleCard::from).collect(),
        }
        .into_response(),
        Err(e) => page_error(&state, &nonce, &e),
    }
}

/// Display a single article.
#[instrument(skip(state, nonce))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    nonce: CspNonce,
) -> Response {
    let storefront = state.storefront();
    let article = match storefront
        .get_article_by_handle(storefront.blog_handle(), &handle)
        .await
    {
        Ok(article) => article,
        Err(e) => return page_error(&state, &nonce, &e),
    };

    // The index listing is cached, so this rarely costs a request
    let recent = storefront
        .get_articles(BLOG_PAGE_SIZE)
        .await
        .map(|articles| {
            articles
                .iter()
                .filter(|a| a.handle != article.handle)
                .take(RECENT_ARTICLES_COUNT)
                .map(ArticleCard::from)
                .collect()
        })
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Recent articles unavailable");
            Vec::new()
        });

    let crumbs = article_breadcrumbs(&article);
    let meta = PageMeta::article(state.config(), &article);

    BlogShowTemplate {
        layout: Layout::new(&state, &nonce, meta).with_breadcrumbs(crumbs),
        article: ArticleCard::from(&article),
        content_html: article.content_html.clone(),
        tags: article.tags.clone(),
        recent,
    }
    .into_response()
}
