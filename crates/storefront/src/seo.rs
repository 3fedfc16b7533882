//! Page metadata, breadcrumbs and JSON-LD structured data.

use serde::Serialize;
use serde_json::{Value, json};

use crate::config::StorefrontConfig;
use crate::shopify::{Article, Collection, Product};

/// Longest meta description, in characters, including the ellipsis.
pub const DESCRIPTION_MAX_CHARS: usize = 160;

/// Fallback description for pages without their own.
pub const DEFAULT_DESCRIPTION: &str = "Mushroom cultivation supplies: grow kits, grain spawn, \
substrates, liquid cultures and lab gear for growing gourmet and medicinal mushrooms at home.";

/// One step in a breadcrumb trail. The current page has no URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreadcrumbItem {
    pub name: String,
    pub url: Option<String>,
}

impl BreadcrumbItem {
    fn link(name: &str, url: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            url: Some(url.into()),
        }
    }

    fn current(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: None,
        }
    }
}

/// Metadata rendered into `<head>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub og_type: &'static str,
    pub og_image: Option<String>,
    /// Serialized JSON-LD documents, one `<script>` each.
    pub json_ld: Vec<String>,
}

/// Collapse whitespace and cut to [`DESCRIPTION_MAX_CHARS`] at a word boundary.
#[must_use]
pub fn truncate_description(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= DESCRIPTION_MAX_CHARS {
        return text;
    }

    let budget = DESCRIPTION_MAX_CHARS - 1;
    let cut: String = text.chars().take(budget).collect();
    // Back up to the last space when the cut lands inside a word
    let next_is_space = text.chars().nth(budget).is_some_and(char::is_whitespace);
    let trimmed = if next_is_space {
        cut.as_str()
    } else {
        cut.rfind(' ').map_or(cut.as_str(), |i| &cut[..i])
    };
    format!(
        "{}…",
        trimmed.trim_end_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
    )
}

fn description_or_default(text: &str) -> String {
    let description = truncate_description(text);
    if description.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        description
    }
}

fn title_with_site(title: &str, site_name: &str) -> String {
    format!("{title} | {site_name}")
}

/// Home → Product, or Home → Collection → Product.
#[must_use]
pub fn product_breadcrumbs(product: &Product, collection: Option<&Collection>) -> Vec<BreadcrumbItem> {
    let mut crumbs = vec![BreadcrumbItem::link("Home", "/")];
    match collection {
        Some(c) => crumbs.push(BreadcrumbItem::link(&c.title, format!("/collections/{}", c.handle))),
        None => crumbs.push(BreadcrumbItem::link("Products", "/products")),
    }
    crumbs.push(BreadcrumbItem::current(&product.title));
    crumbs
}

/// Home → Collections → Collection.
#[must_use]
pub fn collection_breadcrumbs(collection: &Collection) -> Vec<BreadcrumbItem> {
    vec![
        BreadcrumbItem::link("Home", "/"),
        BreadcrumbItem::link("Collections", "/collections"),
        BreadcrumbItem::current(&collection.title),
    ]
}

/// Home → Blog → Article.
#[must_use]
pub fn article_breadcrumbs(article: &Article) -> Vec<BreadcrumbItem> {
    vec![
        BreadcrumbItem::link("Home", "/"),
        BreadcrumbItem::link("Blog", "/blog"),
        BreadcrumbItem::current(&article.title),
    ]
}

/// `BreadcrumbList` with absolute URLs; the last item links to `current_url`.
#[must_use]
pub fn breadcrumb_list_ld(base_url: &str, crumbs: &[BreadcrumbItem], current_url: &str) -> Value {
    let items: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(i, crumb)| {
            let item = crumb
                .url
                .as_ref()
                .map_or_else(|| current_url.to_string(), |url| format!("{base_url}{url}"));
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": crumb.name,
                "item": item,
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    })
}

/// `Organization` for the home page.
#[must_use]
pub fn organization_ld(config: &StorefrontConfig) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": config.site_name,
        "url": config.absolute_url("/"),
        "logo": config.absolute_url("/static/images/logo.svg"),
    })
}

/// `Product` with offers, availability and aggregate rating when present.
#[must_use]
pub fn product_ld(config: &StorefrontConfig, product: &Product) -> Value {
    let url = config.absolute_url(&format!("/products/{}", product.handle));
    let availability = if product.is_available() {
        "https://schema.org/InStock"
    } else {
        "https://schema.org/OutOfStock"
    };

    let offers: Vec<Value> = product
        .variants
        .iter()
        .map(|variant| {
            json!({
                "@type": "Offer",
                "sku": variant.sku,
                "price": variant.price.amount,
                "priceCurrency": variant.price.currency_code,
                "availability": if variant.available_for_sale {
                    "https://schema.org/InStock"
                } else {
                    "https://schema.org/OutOfStock"
                },
                "url": url,
            })
        })
        .collect();

    let mut ld = json!({
        "@context": "https://schema.org",
        "@type": "Product",
        "name": product.title,
        "description": truncate_description(&product.description),
        "url": url,
        "image": product.images.iter().map(|i| i.url.as_str()).collect::<Vec<_>>(),
        "brand": { "@type": "Brand", "name": product.vendor },
        "availability": availability,
        "offers": offers,
    });

    if let Some(rating) = &product.rating
        && rating.count > 0
        && let Some(obj) = ld.as_object_mut()
    {
        obj.insert(
            "aggregateRating".to_string(),
            json!({
                "@type": "AggregateRating",
                "ratingValue": rating.value,
                "bestRating": rating.scale_max,
                "reviewCount": rating.count,
            }),
        );
    }

    ld
}

/// `BlogPosting` for an article page.
#[must_use]
pub fn blog_posting_ld(config: &StorefrontConfig, article: &Article) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": article.title,
        "description": truncate_description(&article.summary()),
        "datePublished": article.published_at,
        "url": config.absolute_url(&format!("/blog/{}", article.handle)),
        "image": article.image.as_ref().map(|i| i.url.as_str()),
        "author": {
            "@type": "Person",
            "name": article.author_name.as_deref().unwrap_or(&config.site_name),
        },
        "publisher": {
            "@type": "Organization",
            "name": config.site_name,
            "logo": {
                "@type": "ImageObject",
                "url": config.absolute_url("/static/images/logo.svg"),
            },
        },
    })
}

impl PageMeta {
    /// Metadata for a page with no structured data of its own.
    #[must_use]
    pub fn basic(config: &StorefrontConfig, title: &str, path: &str) -> Self {
        Self {
            title: title_with_site(title, &config.site_name),
            description: DEFAULT_DESCRIPTION.to_string(),
            canonical_url: config.absolute_url(path),
            og_type: "website",
            og_image: None,
            json_ld: Vec::new(),
        }
    }

    #[must_use]
    pub fn home(config: &StorefrontConfig) -> Self {
        Self {
            title: format!("{} | Mushroom Growing Supplies", config.site_name),
            description: DEFAULT_DESCRIPTION.to_string(),
            canonical_url: config.absolute_url("/"),
            og_type: "website",
            og_image: None,
            json_ld: vec![organization_ld(config).to_string()],
        }
    }

    #[must_use]
    pub fn product(
        config: &StorefrontConfig,
        product: &Product,
        crumbs: &[BreadcrumbItem],
    ) -> Self {
        let path = format!("/products/{}", product.handle);
        let canonical_url = config.absolute_url(&path);
        let title = product
            .seo
            .title
            .clone()
            .unwrap_or_else(|| title_with_site(&product.title, &config.site_name));
        let description = product
            .seo
            .description
            .as_deref()
            .map_or_else(|| description_or_default(&product.description), truncate_description);

        Self {
            title,
            description,
            og_type: "product",
            og_image: Some(config.absolute_url(&format!("/og/product/{}", product.handle))),
            json_ld: vec![
                product_ld(config, product).to_string(),
                breadcrumb_list_ld(&config.base_url, crumbs, &canonical_url).to_string(),
            ],
            canonical_url,
        }
    }

    #[must_use]
    pub fn collection(config: &StorefrontConfig, collection: &Collection) -> Self {
        let canonical_url = config.absolute_url(&format!("/collections/{}", collection.handle));
        let title = collection
            .seo
            .title
            .clone()
            .unwrap_or_else(|| title_with_site(&collection.title, &config.site_name));
        let description = collection.seo.description.as_deref().map_or_else(
            || description_or_default(&collection.description),
            truncate_description,
        );
        let crumbs = collection_breadcrumbs(collection);

        Self {
            title,
            description,
            og_type: "website",
            og_image: Some(config.absolute_url(&format!("/og/collection/{}", collection.handle))),
            json_ld: vec![breadcrumb_list_ld(&config.base_url, &crumbs, &canonical_url).to_string()],
            canonical_url,
        }
    }

    #[must_use]
    pub fn article(config: &StorefrontConfig, article: &Article) -> Self {
        let canonical_url = config.absolute_url(&format!("/blog/{}", article.handle));
        let title = article
            .seo
            .title
            .clone()
            .unwrap_or_else(|| title_with_site(&article.title, &config.site_name));
        let description = article
            .seo
            .description
            .as_deref()
            .map_or_else(|| description_or_default(&article.summary()), truncate_description);
        let crumbs = article_breadcrumbs(article);

        Self {
            title,
            description,
            og_type: "article",
            og_image: Some(config.absolute_url(&format!("/og/article/{}", article.handle))),
            json_ld: vec![
                blog_posting_ld(config, article).to_string(),
                breadcrumb_list_ld(&config.base_url, &crumbs, &canonical_url).to_string(),
            ],
            canonical_url,
        }
    }

    /// Search pages are canonicalised to the query, without filters or paging.
    #[must_use]
    pub fn search(config: &StorefrontConfig, query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() {
            return Self::basic(config, "Search", "/search");
        }

        Self {
            title: title_with_site(&format!("Search results for \"{query}\""), &config.site_name),
            description: truncate_description(&format!(
                "Mushroom cultivation supplies matching \"{query}\" at {}.",
                config.site_name
            )),
            canonical_url: config.absolute_url(&format!(
                "/search?{}",
                url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("q", query)
                    .finish()
            )),
            og_type: "website",
            og_image: None,
            json_ld: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::shopify::ProductRating;
    use crate::test_support::{article, collection, product};

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_description("  Fresh   oyster spawn. "), "Fresh oyster spawn.");
        assert_eq!(truncate_description(""), "");
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        let text = "Sterilized rye berries ".repeat(12);
        let truncated = truncate_description(&text);

        assert!(truncated.chars().count() <= DESCRIPTION_MAX_CHARS);
        assert!(truncated.ends_with('…'));
        let body = truncated.trim_end_matches('…');
        assert!(text.starts_with(body));
        assert!(!body.ends_with(' '));
        // The cut lands between words
        let next = text.chars().nth(body.chars().count()).unwrap();
        assert_eq!(next, ' ');
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "Pleurotus ostreatus – ".repeat(20);
        let truncated = truncate_description(&text);
        assert!(truncated.chars().count() <= DESCRIPTION_MAX_CHARS);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_breadcrumbs() {
        let kit = product("oyster-kit", "Oyster Kit", "24.00");
        let kits = collection("grow-kits", "Grow Kits", vec![]);

        let crumbs = product_breadcrumbs(&kit, Some(&kits));
        assert_eq!(crumbs.len(), 3);
        assert_eq!(crumbs[1].url.as_deref(), Some("/collections/grow-kits"));
        assert_eq!(crumbs[2].url, None);

        let crumbs = product_breadcrumbs(&kit, None);
        assert_eq!(crumbs[1].name, "Products");

        let post = article("agar-101", "Agar 101", "2025-02-01T00:00:00Z");
        let crumbs = article_breadcrumbs(&post);
        assert_eq!(crumbs[1].url.as_deref(), Some("/blog"));
        assert_eq!(crumbs[2].name, "Agar 101");
    }

    #[test]
    fn test_breadcrumb_list_ld() {
        let kits = collection("grow-kits", "Grow Kits", vec![]);
        let crumbs = collection_breadcrumbs(&kits);
        let ld = breadcrumb_list_ld(
            "https://sporeline.test",
            &crumbs,
            "https://sporeline.test/collections/grow-kits",
        );

        assert_eq!(ld["@type"], "BreadcrumbList");
        let items = ld["itemListElement"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["position"], 1);
        assert_eq!(items[0]["item"], "https://sporeline.test/");
        assert_eq!(items[2]["item"], "https://sporeline.test/collections/grow-kits");
    }

    #[test]
    fn test_product_ld() {
        let config = test_config();
        let mut kit = product("lions-mane-kit", "Lion's Mane Kit", "29.00");
        let ld = product_ld(&config, &kit);
        assert_eq!(ld["@type"], "Product");
        assert_eq!(ld["offers"][0]["price"], "29.00");
        assert_eq!(ld["offers"][0]["priceCurrency"], "USD");
        assert_eq!(ld["availability"], "https://schema.org/InStock");
        assert!(ld.get("aggregateRating").is_none());

        kit.rating = Some(ProductRating {
            value: 4.6,
            scale_max: 5.0,
            count: 31,
        });
        kit.available_for_sale = false;
        kit.variants[0].available_for_sale = false;
        let ld = product_ld(&config, &kit);
        assert_eq!(ld["aggregateRating"]["reviewCount"], 31);
        assert_eq!(ld["availability"], "https://schema.org/OutOfStock");
    }

    #[test]
    fn test_product_meta() {
        let config = test_config();
        let mut kit = product("oyster-kit", "Oyster Kit", "24.00");
        kit.description = "Fruits in ten days.".to_string();
        let crumbs = product_breadcrumbs(&kit, None);
        let meta = PageMeta::product(&config, &kit, &crumbs);

        assert_eq!(meta.title, "Oyster Kit | Sporeline Mycology Supply");
        assert_eq!(meta.description, "Fruits in ten days.");
        assert_eq!(meta.canonical_url, "http://localhost:3000/products/oyster-kit");
        assert_eq!(meta.og_type, "product");
        assert_eq!(
            meta.og_image.as_deref(),
            Some("http://localhost:3000/og/product/oyster-kit")
        );
        assert_eq!(meta.json_ld.len(), 2);

        kit.seo.title = Some("Oyster Mushroom Grow Kit".to_string());
        kit.description.clear();
        let meta = PageMeta::product(&config, &kit, &crumbs);
        assert_eq!(meta.title, "Oyster Mushroom Grow Kit");
        assert_eq!(meta.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_article_meta() {
        let config = test_config();
        let post = article("agar-101", "Agar 101", "2025-02-01T00:00:00Z");
        let meta = PageMeta::article(&config, &post);
        assert_eq!(meta.og_type, "article");
        assert_eq!(meta.description, "All about Agar 101.");
        assert!(meta.json_ld[0].contains("\"BlogPosting\""));
    }

    #[test]
    fn test_search_meta() {
        let config = test_config();
        let meta = PageMeta::search(&config, " lion's mane ");
        assert_eq!(
            meta.canonical_url,
            "http://localhost:3000/search?q=lion%27s+mane"
        );
        assert!(meta.title.starts_with("Search results for \"lion's mane\""));

        let meta = PageMeta::search(&config, "");
        assert_eq!(meta.canonical_url, "http://localhost:3000/search");
    }

    #[test]
    fn test_home_meta() {
        let meta = PageMeta::home(&test_config());
        assert_eq!(meta.canonical_url, "http://localhost:3000/");
        assert!(meta.json_ld[0].contains("\"Organization\""));
    }
}
