//! Search route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::Layout;
use crate::routes::products::ProductCard;
use crate::search::{ProductHit, SearchFacets, SearchParams, SearchResults, SearchSort};
use crate::seo::PageMeta;
use crate::state::AppState;

/// Suggestion query parameters.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

/// JSON search response.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub products: Vec<ProductHit>,
    pub facets: SearchFacets,
}

impl From<SearchResults> for SearchResponse {
    fn from(results: SearchResults) -> Self {
        Self {
            products: results.products.iter().map(ProductHit::from).collect(),
            query: results.query,
            total: results.total,
            page: results.page,
            per_page: results.per_page,
            total_pages: results.total_pages,
            facets: results.facets,
        }
    }
}

/// JSON suggestion response.
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub query: String,
    pub suggestions: Vec<ProductHit>,
}

/// A selectable facet value.
#[derive(Clone)]
pub struct FacetOption {
    pub value: String,
    pub selected: bool,
}

fn facet_options(values: &[String], current: Option<&str>) -> Vec<FacetOption> {
    values
        .iter()
        .map(|value| FacetOption {
            value: value.clone(),
            selected: current.is_some_and(|c| c.eq_ignore_ascii_case(value)),
        })
        .collect()
}

/// Sort menu entry.
#[derive(Clone)]
pub struct SearchSortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Query string for `params` on another page.
fn page_url(params: &SearchParams, page: usize) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("q", &params.q);
    if params.sort != SearchSort::Relevance {
        query.append_pair("sort", params.sort.as_str());
    }
    if params.available {
        query.append_pair("available", "1");
    }
    if let Some(min) = params.min_price {
        query.append_pair("min_price", &min.to_string());
    }
    if let Some(max) = params.max_price {
        query.append_pair("max_price", &max.to_string());
    }
    if let Some(product_type) = &params.product_type {
        query.append_pair("product_type", product_type);
    }
    if let Some(vendor) = &params.vendor {
        query.append_pair("vendor", vendor);
    }
    if let Some(per_page) = params.per_page {
        query.append_pair("per_page", &per_page.to_string());
    }
    query.append_pair("page", &page.to_string());
    format!("/search?{}", query.finish())
}

/// Search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchPageTemplate {
    pub layout: Layout,
    pub query: String,
    pub products: Vec<ProductCard>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub sort_options: Vec<SearchSortOption>,
    pub product_types: Vec<FacetOption>,
    pub vendors: Vec<FacetOption>,
    pub available: bool,
    pub min_price: String,
    pub max_price: String,
    pub price_hint: String,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Display the search page.
#[instrument(skip(state, nonce, params), fields(q = %params.q))]
pub async fn page(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    nonce: CspNonce,
) -> impl IntoResponse {
    let results = state.search().get_search_data(&params).await;

    let price_hint = match (results.facets.min_price, results.facets.max_price) {
        (Some(min), Some(max)) => format!("${min:.2} – ${max:.2}"),
        _ => String::new(),
    };
    let prev_url = (results.page > 1).then(|| page_url(&params, results.page - 1));
    let next_url = results
        .has_next_page()
        .then(|| page_url(&params, results.page + 1));

    SearchPageTemplate {
        layout: Layout::new(&state, &nonce, PageMeta::search(state.config(), &params.q)),
        query: params.q.trim().to_string(),
        products: results.products.iter().map(ProductCard::from).collect(),
        total: results.total,
        page: results.page,
        total_pages: results.total_pages,
        sort_options: SearchSort::ALL
            .into_iter()
            .map(|sort| SearchSortOption {
                value: sort.as_str(),
                label: sort.label(),
                selected: sort == params.sort,
            })
            .collect(),
        product_types: facet_options(
            &results.facets.product_types,
            params.product_type.as_deref(),
        ),
        vendors: facet_options(&results.facets.vendors, params.vendor.as_deref()),
        available: params.available,
        min_price: params.min_price.map(|d| d.to_string()).unwrap_or_default(),
        max_price: params.max_price.map(|d| d.to_string()).unwrap_or_default(),
        price_hint,
        prev_url,
        next_url,
    }
}

/// JSON search results.
#[instrument(skip(state, params), fields(q = %params.q))]
pub async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    Json(state.search().get_search_data(&params).await.into())
}

/// JSON typeahead suggestions.
#[instrument(skip(state, query), fields(q = %query.q))]
pub async fn api_suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Json<SuggestResponse> {
    let suggestions = state.search().suggest(&query.q).await;
    Json(SuggestResponse {
        query: query.q,
        suggestions,
    })
}
