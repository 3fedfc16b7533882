//! RSS feed, sitemaps and robots.txt.
//!
//! The XML documents are askama templates under `templates/feeds/`, so every
//! interpolated value is escaped by the template engine.

use askama::Template;
use chrono::DateTime;

use crate::shopify::{Article, Collection, Product};

/// Articles included in the RSS feed.
pub const RSS_ARTICLE_LIMIT: i64 = 50;

/// Images listed per product in the image sitemap.
pub const SITEMAP_IMAGES_PER_PRODUCT: usize = 10;

/// Pages that exist regardless of catalog content.
pub const STATIC_PAGES: [&str; 5] = ["/", "/products", "/collections", "/blog", "/search"];

/// RFC 3339 timestamp to RFC 2822, as RSS `pubDate` expects.
#[must_use]
pub fn rfc2822(timestamp: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.to_rfc2822())
}

/// RFC 3339 timestamp to the `YYYY-MM-DD` form used for `lastmod`.
#[must_use]
pub fn w3c_date(timestamp: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Site identity used in feed headers.
#[derive(Debug, Clone, Copy)]
pub struct FeedSite<'a> {
    /// Base URL without trailing slash.
    pub base_url: &'a str,
    pub name: &'a str,
    pub description: &'a str,
}

struct RssItem<'a> {
    title: &'a str,
    link: String,
    pub_date: Option<String>,
    description: String,
    author: Option<&'a str>,
    tags: &'a [String],
}

#[derive(Template)]
#[template(path = "feeds/rss.xml")]
struct RssTemplate<'a> {
    site: FeedSite<'a>,
    last_build_date: Option<String>,
    items: Vec<RssItem<'a>>,
}

struct SitemapUrl {
    loc: String,
    lastmod: Option<String>,
}

#[derive(Template)]
#[template(path = "feeds/sitemap.xml")]
struct SitemapTemplate {
    urls: Vec<SitemapUrl>,
}

struct SitemapImage<'a> {
    loc: &'a str,
    title: &'a str,
}

struct ImageSitemapUrl<'a> {
    loc: String,
    images: Vec<SitemapImage<'a>>,
}

#[derive(Template)]
#[template(path = "feeds/sitemap-images.xml")]
struct ImageSitemapTemplate<'a> {
    urls: Vec<ImageSitemapUrl<'a>>,
}

/// RSS 2.0 channel of blog articles, in the order given.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn rss_feed(site: FeedSite<'_>, articles: &[Article]) -> askama::Result<String> {
    let items = articles
        .iter()
        .map(|article| RssItem {
            title: &article.title,
            link: format!("{}/blog/{}", site.base_url, article.handle),
            pub_date: rfc2822(&article.published_at),
            description: article.summary(),
            author: article.author_name.as_deref(),
            tags: &article.tags,
        })
        .collect();

    RssTemplate {
        site,
        last_build_date: articles.first().and_then(|a| rfc2822(&a.published_at)),
        items,
    }
    .render()
}

/// Sitemap of static pages, products, collections and articles.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn sitemap(
    base_url: &str,
    products: &[Product],
    collections: &[Collection],
    articles: &[Article],
) -> askama::Result<String> {
    let pages = STATIC_PAGES.iter().map(|page| SitemapUrl {
        loc: format!("{base_url}{page}"),
        lastmod: None,
    });
    let products = products.iter().map(|product| SitemapUrl {
        loc: format!("{base_url}/products/{}", product.handle),
        lastmod: product.updated_at.as_deref().and_then(w3c_date),
    });
    let collections = collections.iter().map(|collection| SitemapUrl {
        loc: format!("{base_url}/collections/{}", collection.handle),
        lastmod: collection.updated_at.as_deref().and_then(w3c_date),
    });
    let articles = articles.iter().map(|article| SitemapUrl {
        loc: format!("{base_url}/blog/{}", article.handle),
        lastmod: w3c_date(&article.published_at),
    });

    SitemapTemplate {
        urls: pages.chain(products).chain(collections).chain(articles).collect(),
    }
    .render()
}

/// Image sitemap: one `<url>` per product that has images.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn image_sitemap(base_url: &str, products: &[Product]) -> askama::Result<String> {
    let urls = products
        .iter()
        .filter(|p| !p.images.is_empty())
        .map(|product| ImageSitemapUrl {
            loc: format!("{base_url}/products/{}", product.handle),
            images: product
                .images
                .iter()
                .take(SITEMAP_IMAGES_PER_PRODUCT)
                .map(|image| SitemapImage {
                    loc: &image.url,
                    title: image.alt_text.as_deref().unwrap_or(&product.title),
                })
                .collect(),
        })
        .collect();

    ImageSitemapTemplate { urls }.render()
}

/// robots.txt allowing everything except private and API paths.
#[must_use]
pub fn robots_txt(base_url: &str) -> String {
    format!(
        "User-agent: *\n\
         Allow: /\n\
         Disallow: /api/\n\
         Disallow: /cart\n\
         Disallow: /wishlist\n\
         \n\
         Sitemap: {base_url}/sitemap.xml\n\
         Sitemap: {base_url}/sitemap-images.xml\n"
    )
}
