//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::products::{ImageView, ProductCard, SortOption, sort_options};
use crate::routes::{Layout, page_error};
use crate::seo::{PageMeta, collection_breadcrumbs, truncate_description};
use crate::shopify::{Collection, CollectionSort};
use crate::state::AppState;

/// Collections on the listing page.
const COLLECTIONS_LIMIT: i64 = 50;

/// Collection card for grids.
#[derive(Clone)]
pub struct CollectionCard {
    pub handle: String,
    pub title: String,
    pub description: String,
    pub image: Option<ImageView>,
}

impl From<&Collection> for CollectionCard {
    fn from(collection: &Collection) -> Self {
        Self {
            handle: collection.handle.clone(),
            title: collection.title.clone(),
            description: truncate_description(&collection.description),
            image: collection
                .image
                .as_ref()
                .map(|img| ImageView::from_image(img, &collection.title)),
        }
    }
}

/// Accept `1`, `true`, `on` as true.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(matches!(value.as_deref(), Some("1" | "true" | "on")))
}

/// Collection page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionQuery {
    pub sort: Option<String>,
    /// Hide sold-out products.
    #[serde(default, deserialize_with = "flag")]
    pub in_stock: bool,
}

/// Collection listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub layout: Layout,
    pub collections: Vec<CollectionCard>,
}

/// Collection detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub layout: Layout,
    pub collection: CollectionCard,
    pub description_html: String,
    pub products: Vec<ProductCard>,
    pub sort: &'static str,
    pub sort_options: Vec<SortOption>,
    pub in_stock: bool,
    /// Products hidden by the in-stock filter.
    pub hidden_count: usize,
}

/// Display the collection listing page.
#[instrument(skip(state, nonce))]
pub async fn index(State(state): State<AppState>, nonce: CspNonce) -> Response {
    match state.storefront().get_collections(COLLECTIONS_LIMIT, None).await {
        Ok(connection) => CollectionsIndexTemplate {
            layout: Layout::new(
                &state,
                &nonce,
                PageMeta::basic(state.config(), "Collections", "/collections"),
            ),
            collections: connection
                .collections
                .iter()
                .map(CollectionCard::from)
                .collect(),
        }
        .into_response(),
        Err(e) => page_error(&state, &nonce, &e),
    }
}

/// Display a collection with sorting and an in-stock filter.
#[instrument(skip(state, nonce))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<CollectionQuery>,
    nonce: CspNonce,
) -> Response {
    let sort = CollectionSort::from_param(query.sort.as_deref());
    let collection = match state
        .storefront()
        .get_collection_by_handle(&handle, sort)
        .await
    {
        Ok(collection) => collection,
        Err(e) => return page_error(&state, &nonce, &e),
    };

    let products: Vec<ProductCard> = collection
        .products
        .iter()
        .filter(|p| !query.in_stock || p.is_available())
        .map(ProductCard::from)
        .collect();
    let hidden_count = collection.products.len() - products.len();

    let crumbs = collection_breadcrumbs(&collection);
    let meta = PageMeta::collection(state.config(), &collection);

    CollectionShowTemplate {
        layout: Layout::new(&state, &nonce, meta).with_breadcrumbs(crumbs),
        collection: CollectionCard::from(&collection),
        description_html: collection.description_html.clone(),
        products,
        sort: sort.as_param(),
        sort_options: sort_options(sort),
        in_stock: query.in_stock,
        hidden_count,
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::{get, test_app};
    use crate::test_support::collection;

    #[test]
    fn test_query_parsing() {
        let query = parse_query("sort=price-desc&in_stock=1");
        assert_eq!(query.sort.as_deref(), Some("price-desc"));
        assert!(query.in_stock);

        let query = parse_query("in_stock=no");
        assert!(!query.in_stock);
    }

    fn parse_query(qs: &str) -> CollectionQuery {
        let uri: axum::http::Uri = format!("/c?{qs}").parse().unwrap();
        Query::<CollectionQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_card_truncates_description() {
        let mut c = collection("grain-spawn", "Grain Spawn", Vec::new());
        c.description = "Sterilised rye berries. ".repeat(20);
        let card = CollectionCard::from(&c);
        assert!(card.description.chars().count() <= 160);
        assert!(card.description.ends_with('…'));
        assert_eq!(card.image.unwrap().alt, "grain spawn");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let (app, _) = test_app();
        let response = app.oneshot(get("/collections/grow-kits")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
