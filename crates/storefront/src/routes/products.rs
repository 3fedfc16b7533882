//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sporeline_core::ShopifyGid;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::models::Wishlist;
use crate::routes::{Layout, page_error};
use crate::seo::{PageMeta, product_breadcrumbs};
use crate::shopify::{CollectionSort, Image, Product, ProductSortKey, ProductVariant};
use crate::state::AppState;

/// Products per listing page.
pub const PRODUCTS_PER_PAGE: i64 = 24;

/// Recommendations shown under a product.
const RECOMMENDATION_LIMIT: usize = 4;

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
    pub width: i64,
    pub height: i64,
}

impl ImageView {
    #[must_use]
    pub fn from_image(image: &Image, fallback_alt: &str) -> Self {
        Self {
            url: image.url.clone(),
            alt: image
                .alt_text
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| fallback_alt.to_string()),
            width: image.width.unwrap_or(800),
            height: image.height.unwrap_or(800),
        }
    }
}

/// Product card for grids.
#[derive(Clone)]
pub struct ProductCard {
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<ImageView>,
    pub available: bool,
}

/// Compare-at price of a variant, when it is actually higher.
fn compare_at(variant: &ProductVariant) -> Option<String> {
    let compare = variant.compare_at_price.as_ref()?;
    (compare.decimal()? > variant.price.decimal()?).then(|| compare.display())
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            vendor: product.vendor.clone(),
            price: product.price_display(),
            compare_at_price: product.default_variant().and_then(compare_at),
            image: product
                .primary_image()
                .map(|img| ImageView::from_image(img, &product.title)),
            available: product.is_available(),
        }
    }
}

/// Variant option for the add-to-cart form.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub title: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub available: bool,
    pub selected: bool,
}

/// Product display data for the detail page.
#[derive(Clone)]
pub struct ProductDetail {
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub product_type: String,
    pub description_html: String,
    pub price: String,
    pub available: bool,
    pub images: Vec<ImageView>,
    pub variants: Vec<VariantView>,
    /// Only a `Default Title` variant; the picker is hidden.
    pub single_variant: bool,
    /// Numeric id for the reviews widget.
    pub review_id: Option<String>,
    pub rating_value: Option<String>,
    pub rating_count: i64,
}

impl From<&Product> for ProductDetail {
    fn from(product: &Product) -> Self {
        let default_id = product.default_variant().map(|v| v.id.as_str());
        let variants: Vec<VariantView> = product
            .variants
            .iter()
            .map(|v| VariantView {
                id: v.id.clone(),
                title: v.title.clone(),
                price: v.price.display(),
                compare_at_price: compare_at(v),
                available: v.available_for_sale,
                selected: Some(v.id.as_str()) == default_id,
            })
            .collect();

        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            vendor: product.vendor.clone(),
            product_type: product.product_type.clone(),
            description_html: product.description_html.clone(),
            price: product.price_display(),
            available: product.is_available(),
            images: product
                .images
                .iter()
                .map(|img| ImageView::from_image(img, &product.title))
                .collect(),
            single_variant: variants.len() == 1 && variants.iter().all(|v| v.title == "Default Title"),
            variants,
            review_id: ShopifyGid::numeric_product_id(&product.id).ok(),
            rating_value: product.rating.as_ref().map(|r| format!("{:.1}", r.value)),
            rating_count: product.rating.as_ref().map_or(0, |r| r.count),
        }
    }
}

/// One entry of a sort menu.
#[derive(Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Sort menu with `current` selected.
#[must_use]
pub fn sort_options(current: CollectionSort) -> Vec<SortOption> {
    CollectionSort::ALL
        .into_iter()
        .map(|sort| SortOption {
            value: sort.as_param(),
            label: sort.label(),
            selected: sort == current,
        })
        .collect()
}

/// Storefront sort key and direction for a listing sort.
#[must_use]
pub const fn listing_sort(sort: CollectionSort) -> (ProductSortKey, bool) {
    match sort {
        CollectionSort::Featured | CollectionSort::BestSelling => (ProductSortKey::BestSelling, false),
        CollectionSort::PriceAsc => (ProductSortKey::Price, false),
        CollectionSort::PriceDesc => (ProductSortKey::Price, true),
        CollectionSort::TitleAsc => (ProductSortKey::Title, false),
        CollectionSort::TitleDesc => (ProductSortKey::Title, true),
        CollectionSort::Newest => (ProductSortKey::CreatedAt, true),
    }
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub sort: Option<String>,
    /// Cursor of the last product on the previous page.
    pub after: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
    pub sort: &'static str,
    pub sort_options: Vec<SortOption>,
    pub next_url: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductDetail,
    pub recommendations: Vec<ProductCard>,
    pub in_wishlist: bool,
    pub reviews_enabled: bool,
}

/// Display the product listing page.
#[instrument(skip(state, nonce))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
    nonce: CspNonce,
) -> Response {
    let sort = CollectionSort::from_param(query.sort.as_deref());
    let (sort_key, reverse) = listing_sort(sort);

    let connection = match state
        .storefront()
        .get_products(
            PRODUCTS_PER_PAGE,
            query.after.clone(),
            None,
            Some(sort_key),
            Some(reverse),
        )
        .await
    {
        Ok(connection) => connection,
        Err(e) => return page_error(&state, &nonce, &e),
    };

    let next_url = connection
        .page_info
        .end_cursor
        .filter(|_| connection.page_info.has_next_page)
        .map(|cursor| {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("sort", sort.as_param())
                .append_pair("after", &cursor)
                .finish();
            format!("/products?{query}")
        });

    let mut meta = PageMeta::basic(state.config(), "All products", "/products");
    if query.after.is_some() {
        meta.description = format!("More mushroom growing supplies from {}.", state.config().site_name);
    }

    ProductsIndexTemplate {
        layout: Layout::new(&state, &nonce, meta),
        products: connection.products.iter().map(ProductCard::from).collect(),
        sort: sort.as_param(),
        sort_options: sort_options(sort),
        next_url,
    }
    .into_response()
}

/// Display the product detail page.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    session: Session,
    nonce: CspNonce,
) -> Response {
    let product = match state.storefront().get_product_by_handle(&handle).await {
        Ok(product) => product,
        Err(e) => return page_error(&state, &nonce, &e),
    };

    let recommendations = state
        .storefront()
        .get_product_recommendations(&product.id)
        .await
        .map(|products| {
            products
                .iter()
                .filter(|p| p.handle != product.handle)
                .take(RECOMMENDATION_LIMIT)
                .map(ProductCard::from)
                .collect()
        })
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Recommendations unavailable");
            Vec::new()
        });

    let in_wishlist = Wishlist::load(&session).await.contains(&product.handle);
    let crumbs = product_breadcrumbs(&product, None);
    let meta = PageMeta::product(state.config(), &product, &crumbs);

    ProductShowTemplate {
        layout: Layout::new(&state, &nonce, meta).with_breadcrumbs(crumbs),
        product: ProductDetail::from(&product),
        recommendations,
        in_wishlist,
        reviews_enabled: state.reviews().is_some(),
    }
    .into_response()
}
