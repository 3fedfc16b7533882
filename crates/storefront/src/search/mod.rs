//! Catalog search.
//!
//! The catalog is small enough to search linearly: every query lowercases
//! its terms and keeps the products whose text contains all of them, then
//! applies filters, sorts and paginates. [`SearchService`] keeps the product
//! list in memory between requests.

mod service;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::shopify::Product;

pub use service::SearchService;

/// Default page size.
pub const DEFAULT_PER_PAGE: usize = 24;
/// Largest allowed page size.
pub const MAX_PER_PAGE: usize = 100;

/// Deserialize empty strings as `None` for optional query-string values.
fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Accept `1`, `true`, `on` as true and anything else as false.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(matches!(
        s.as_deref().map(str::trim),
        Some("1" | "true" | "on")
    ))
}

/// Sort order for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchSort {
    /// Title matches first, then catalog order.
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    TitleAsc,
    TitleDesc,
    Newest,
}

impl SearchSort {
    /// Every option, in menu order.
    pub const ALL: [Self; 6] = [
        Self::Relevance,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::TitleAsc,
        Self::TitleDesc,
        Self::Newest,
    ];

    /// Parse a query-string value, defaulting to relevance.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .unwrap_or_default()
    }

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::TitleAsc => "title-asc",
            Self::TitleDesc => "title-desc",
            Self::Newest => "newest",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relevance => "Relevance",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::TitleAsc => "Name: A to Z",
            Self::TitleDesc => "Name: Z to A",
            Self::Newest => "Newest",
        }
    }
}

/// Search parameters, as parsed from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchParams {
    /// Free-text query.
    #[serde(default)]
    pub q: String,
    /// Sort order.
    #[serde(default, deserialize_with = "deserialize_sort")]
    pub sort: SearchSort,
    /// Only products with a variant in stock.
    #[serde(default, deserialize_with = "flag")]
    pub available: bool,
    /// Inclusive lower bound on the minimum variant price.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub min_price: Option<Decimal>,
    /// Inclusive upper bound on the minimum variant price.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub max_price: Option<Decimal>,
    /// Product type, case-insensitive.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub product_type: Option<String>,
    /// Vendor, case-insensitive.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub vendor: Option<String>,
    /// 1-based page number.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<usize>,
    /// Page size.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub per_page: Option<usize>,
}

fn deserialize_sort<'de, D>(deserializer: D) -> Result<SearchSort, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| SearchSort::parse(s.trim())).unwrap_or_default())
}

impl SearchParams {
    /// Parameters for a plain text query.
    #[must_use]
    pub fn query(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    /// Lowercased query terms.
    #[must_use]
    pub fn terms(&self) -> Vec<String> {
        self.q
            .trim()
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect()
    }

    /// Effective page size.
    #[must_use]
    pub fn per_page(&self) -> usize {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Effective 1-based page number.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Whether any filter narrows the results.
    #[must_use]
    pub const fn has_filters(&self) -> bool {
        self.available
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.product_type.is_some()
            || self.vendor.is_some()
    }
}

/// Filter options derived from the products a query matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchFacets {
    /// Distinct product types, sorted.
    pub product_types: Vec<String>,
    /// Distinct vendors, sorted.
    pub vendors: Vec<String>,
    /// Cheapest minimum variant price.
    pub min_price: Option<Decimal>,
    /// Most expensive minimum variant price.
    pub max_price: Option<Decimal>,
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    /// The query as typed.
    pub query: String,
    /// Products on this page.
    pub products: Vec<Product>,
    /// Matches after filters, before pagination.
    pub total: usize,
    /// Current page (1-based).
    pub page: usize,
    /// Page size.
    pub per_page: usize,
    /// Number of pages.
    pub total_pages: usize,
    /// Filter options for the matched products.
    pub facets: SearchFacets,
}

impl SearchResults {
    /// Whether nothing matched.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Whether a next page exists.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Lowercased text a product is searched by.
fn haystack(product: &Product) -> String {
    let mut text = String::with_capacity(
        product.title.len() + product.description.len() + product.product_type.len() + 64,
    );
    for part in [
        &product.title,
        &product.description,
        &product.product_type,
        &product.vendor,
    ] {
        text.push_str(part);
        text.push('\n');
    }
    text.push_str(&product.tags.join(" "));
    text.to_lowercase()
}

fn matches_filters(product: &Product, params: &SearchParams) -> bool {
    if params.available && !product.is_available() {
        return false;
    }

    if params.min_price.is_some() || params.max_price.is_some() {
        let Some(price) = product.min_price() else {
            return false;
        };
        if params.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if params.max_price.is_some_and(|max| price > max) {
            return false;
        }
    }

    if let Some(kind) = &params.product_type
        && !eq_ignore_case(&product.product_type, kind)
    {
        return false;
    }

    if let Some(vendor) = &params.vendor
        && !eq_ignore_case(&product.vendor, vendor)
    {
        return false;
    }

    true
}

/// Unicode case-insensitive equality of trimmed values.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn title_score(product: &Product, terms: &[String]) -> usize {
    let title = product.title.to_lowercase();
    terms.iter().filter(|t| title.contains(t.as_str())).count()
}

fn created_at(product: &Product) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    product
        .created_at
        .as_deref()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
}

/// Compare optional keys with `None` always last.
fn none_last<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_matches(matches: &mut [(usize, &Product)], sort: SearchSort, terms: &[String]) {
    // Sorts are stable, so ties keep catalog order
    match sort {
        SearchSort::Relevance => {
            matches.sort_by_key(|(_, p)| std::cmp::Reverse(title_score(p, terms)));
        }
        SearchSort::PriceAsc => {
            matches.sort_by(|(_, a), (_, b)| none_last(a.min_price(), b.min_price(), false));
        }
        SearchSort::PriceDesc => {
            matches.sort_by(|(_, a), (_, b)| none_last(a.min_price(), b.min_price(), true));
        }
        SearchSort::TitleAsc => {
            matches.sort_by_cached_key(|(_, p)| p.title.to_lowercase());
        }
        SearchSort::TitleDesc => {
            matches.sort_by_cached_key(|(_, p)| std::cmp::Reverse(p.title.to_lowercase()));
        }
        SearchSort::Newest => {
            matches.sort_by(|(_, a), (_, b)| none_last(created_at(a), created_at(b), true));
        }
    }
}

fn facets(products: &[&Product]) -> SearchFacets {
    let product_types: BTreeSet<&str> = products
        .iter()
        .map(|p| p.product_type.trim())
        .filter(|t| !t.is_empty())
        .collect();
    let vendors: BTreeSet<&str> = products
        .iter()
        .map(|p| p.vendor.trim())
        .filter(|v| !v.is_empty())
        .collect();
    let prices: Vec<Decimal> = products.iter().filter_map(|p| p.min_price()).collect();

    SearchFacets {
        product_types: product_types.into_iter().map(String::from).collect(),
        vendors: vendors.into_iter().map(String::from).collect(),
        min_price: prices.iter().min().copied(),
        max_price: prices.iter().max().copied(),
    }
}

/// Search, filter, sort and paginate a product list.
///
/// A product matches when every query term is a substring of its title,
/// description, product type, vendor or tags. An empty query matches every
/// product. Facets describe the text matches before filters are applied.
#[must_use]
pub fn search_products(products: &[Product], params: &SearchParams) -> SearchResults {
    let terms = params.terms();

    let text_matches: Vec<&Product> = if terms.is_empty() {
        products.iter().collect()
    } else {
        products
            .iter()
            .filter(|p| {
                let text = haystack(p);
                terms.iter().all(|t| text.contains(t.as_str()))
            })
            .collect()
    };

    let facets = facets(&text_matches);

    let mut matches: Vec<(usize, &Product)> = text_matches
        .into_iter()
        .filter(|p| matches_filters(p, params))
        .enumerate()
        .collect();

    sort_matches(&mut matches, params.sort, &terms);

    let total = matches.len();
    let per_page = params.per_page();
    let page = params.page();
    let total_pages = total.div_ceil(per_page);

    let products = matches
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .map(|(_, p)| p.clone())
        .collect();

    SearchResults {
        query: params.q.trim().to_string(),
        products,
        total,
        page,
        per_page,
        total_pages,
        facets,
    }
}

/// Compact product shape for JSON search responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductHit {
    pub handle: String,
    pub title: String,
    pub product_type: String,
    pub vendor: String,
    pub price: String,
    pub available: bool,
    pub image_url: Option<String>,
    pub url: String,
}

impl From<&Product> for ProductHit {
    fn from(product: &Product) -> Self {
        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            product_type: product.product_type.clone(),
            vendor: product.vendor.clone(),
            price: product.price_display(),
            available: product.is_available(),
            image_url: product.primary_image().map(|i| i.url.clone()),
            url: format!("/products/{}", product.handle),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::product;

    fn catalog() -> Vec<Product> {
        let mut oyster = product("blue-oyster-kit", "Blue Oyster Grow Kit", "24.00");
        oyster.product_type = "Grow Kit".to_string();
        oyster.tags = vec!["beginner".to_string()];
        oyster.created_at = Some("2025-01-10T00:00:00Z".to_string());

        let mut rye = product("rye-grain-spawn", "Sterilized Rye Berries", "18.50");
        rye.product_type = "Grain Spawn".to_string();
        rye.description = "Rye grain for oyster and shiitake spawn.".to_string();
        rye.created_at = Some("2025-03-01T00:00:00Z".to_string());

        let mut lions = product("lions-mane-kit", "Lion's Mane Grow Kit", "32.00");
        lions.product_type = "grow kit".to_string();
        lions.vendor = "FungiFarm".to_string();
        lions.available_for_sale = false;
        lions.variants[0].available_for_sale = false;
        lions.created_at = Some("2025-02-01T00:00:00Z".to_string());

        let mut bags = product("filter-patch-bags", "Filter Patch Bags (10 pack)", "12.00");
        bags.product_type = "Supplies".to_string();
        bags.created_at = None;

        vec![oyster, rye, lions, bags]
    }

    fn handles(results: &SearchResults) -> Vec<&str> {
        results.products.iter().map(|p| p.handle.as_str()).collect()
    }

    #[test]
    fn test_no_match_returns_empty() {
        let results = search_products(&catalog(), &SearchParams::query("reishi"));
        assert!(results.products.is_empty());
        assert_eq!(results.total, 0);
        assert_eq!(results.total_pages, 0);
        assert!(results.is_empty());
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let results = search_products(&catalog(), &SearchParams::query("   "));
        assert_eq!(results.total, 4);
        assert_eq!(
            handles(&results),
            vec![
                "blue-oyster-kit",
                "rye-grain-spawn",
                "lions-mane-kit",
                "filter-patch-bags"
            ]
        );
    }

    #[test]
    fn test_all_terms_must_match() {
        let results = search_products(&catalog(), &SearchParams::query("GROW kit"));
        assert_eq!(handles(&results), vec!["blue-oyster-kit", "lions-mane-kit"]);

        let results = search_products(&catalog(), &SearchParams::query("grow rye"));
        assert!(results.is_empty());
    }

    #[test]
    fn test_relevance_prefers_title_matches() {
        // "oyster" is in the oyster kit's title but only the rye description
        let mut catalog = catalog();
        catalog.swap(0, 1);
        let results = search_products(&catalog, &SearchParams::query("oyster"));
        assert_eq!(handles(&results), vec!["blue-oyster-kit", "rye-grain-spawn"]);
    }

    #[test]
    fn test_searches_tags_vendor_and_type() {
        assert_eq!(
            handles(&search_products(&catalog(), &SearchParams::query("beginner"))),
            vec!["blue-oyster-kit"]
        );
        assert_eq!(
            handles(&search_products(&catalog(), &SearchParams::query("fungifarm"))),
            vec!["lions-mane-kit"]
        );
        assert_eq!(
            handles(&search_products(&catalog(), &SearchParams::query("spawn"))),
            vec!["rye-grain-spawn"]
        );
    }

    #[test]
    fn test_filters() {
        let mut params = SearchParams::query("kit");
        params.available = true;
        assert_eq!(
            handles(&search_products(&catalog(), &params)),
            vec!["blue-oyster-kit"]
        );

        let params = SearchParams {
            min_price: Some(Decimal::new(1850, 2)),
            max_price: Some(Decimal::new(2400, 2)),
            ..SearchParams::default()
        };
        // Bounds are inclusive
        assert_eq!(
            handles(&search_products(&catalog(), &params)),
            vec!["blue-oyster-kit", "rye-grain-spawn"]
        );

        let params = SearchParams {
            product_type: Some("GROW KIT".to_string()),
            ..SearchParams::default()
        };
        assert_eq!(
            handles(&search_products(&catalog(), &params)),
            vec!["blue-oyster-kit", "lions-mane-kit"]
        );

        let params = SearchParams {
            vendor: Some("fungifarm".to_string()),
            ..SearchParams::default()
        };
        assert_eq!(
            handles(&search_products(&catalog(), &params)),
            vec!["lions-mane-kit"]
        );
    }

    #[test]
    fn test_vendor_and_type_filters_fold_unicode_case() {
        let mut products = catalog();
        products[0].vendor = "Pilzgärtnerei".to_string();
        products[0].product_type = "Körnerbrut".to_string();
        let handle = products[0].handle.clone();

        let params = SearchParams {
            vendor: Some(" PILZGÄRTNEREI ".to_string()),
            ..SearchParams::default()
        };
        assert_eq!(handles(&search_products(&products, &params)), vec![handle.as_str()]);

        let params = SearchParams {
            product_type: Some("KÖRNERBRUT".to_string()),
            ..SearchParams::default()
        };
        assert_eq!(handles(&search_products(&products, &params)), vec![handle.as_str()]);

        // The text query folds case the same way
        let params = SearchParams::query("PILZGÄRTNEREI");
        assert_eq!(search_products(&products, &params).total, 1);
    }

    #[test]
    fn test_sorts() {
        let sorted = |sort| {
            let params = SearchParams {
                sort,
                ..SearchParams::default()
            };
            search_products(&catalog(), &params)
                .products
                .into_iter()
                .map(|p| p.handle)
                .collect::<Vec<_>>()
        };

        assert_eq!(
            sorted(SearchSort::PriceAsc),
            vec![
                "filter-patch-bags",
                "rye-grain-spawn",
                "blue-oyster-kit",
                "lions-mane-kit"
            ]
        );
        assert_eq!(
            sorted(SearchSort::PriceDesc),
            vec![
                "lions-mane-kit",
                "blue-oyster-kit",
                "rye-grain-spawn",
                "filter-patch-bags"
            ]
        );
        assert_eq!(
            sorted(SearchSort::TitleAsc),
            vec![
                "blue-oyster-kit",
                "filter-patch-bags",
                "lions-mane-kit",
                "rye-grain-spawn"
            ]
        );
        assert_eq!(sorted(SearchSort::TitleDesc)[0], "rye-grain-spawn");
        // Undated products sort last
        assert_eq!(
            sorted(SearchSort::Newest),
            vec![
                "rye-grain-spawn",
                "lions-mane-kit",
                "blue-oyster-kit",
                "filter-patch-bags"
            ]
        );
    }

    #[test]
    fn test_pagination() {
        let params = SearchParams {
            page: Some(2),
            per_page: Some(3),
            ..SearchParams::default()
        };
        let results = search_products(&catalog(), &params);
        assert_eq!(results.total, 4);
        assert_eq!(results.total_pages, 2);
        assert_eq!(handles(&results), vec!["filter-patch-bags"]);
        assert!(!results.has_next_page());

        let params = SearchParams {
            page: Some(9),
            ..SearchParams::default()
        };
        let results = search_products(&catalog(), &params);
        assert!(results.products.is_empty());
        assert_eq!(results.total, 4);
    }

    #[test]
    fn test_per_page_clamped() {
        let mut params = SearchParams {
            per_page: Some(0),
            ..SearchParams::default()
        };
        assert_eq!(params.per_page(), 1);
        params.per_page = Some(10_000);
        assert_eq!(params.per_page(), MAX_PER_PAGE);
        params.per_page = None;
        assert_eq!(params.per_page(), DEFAULT_PER_PAGE);
        params.page = Some(0);
        assert_eq!(params.page(), 1);
    }

    #[test]
    fn test_facets_cover_text_matches() {
        let mut params = SearchParams::query("kit");
        params.available = true;
        let results = search_products(&catalog(), &params);
        assert_eq!(results.total, 1);
        assert_eq!(results.facets.product_types, vec!["Grow Kit", "grow kit"]);
        assert_eq!(results.facets.vendors, vec!["FungiFarm", "Sporeline"]);
        assert_eq!(results.facets.min_price, Some(Decimal::new(2400, 2)));
        assert_eq!(results.facets.max_price, Some(Decimal::new(3200, 2)));
    }

    #[test]
    fn test_params_from_query_string() {
        let params: SearchParams = parse_query(
            "q=oyster&sort=price-desc&available=1&min_price=&max_price=30&product_type=&page=2",
        );
        assert_eq!(params.q, "oyster");
        assert_eq!(params.sort, SearchSort::PriceDesc);
        assert!(params.available);
        assert_eq!(params.min_price, None);
        assert_eq!(params.max_price, Some(Decimal::new(30, 0)));
        assert_eq!(params.product_type, None);
        assert_eq!(params.page, Some(2));

        let params: SearchParams = parse_query("sort=bogus&available=0");
        assert_eq!(params.sort, SearchSort::Relevance);
        assert!(!params.available);
    }

    /// Parse a query string the way axum's `Query` extractor does.
    fn parse_query(qs: &str) -> SearchParams {
        let uri: axum::http::Uri = format!("/search?{qs}").parse().unwrap();
        axum::extract::Query::<SearchParams>::try_from_uri(&uri)
            .unwrap()
            .0
    }
}
