//! Product and collection conversions.

use crate::shopify::types::{
    Collection, CollectionConnection, PriceRange, Product, ProductConnection, ProductRating,
    ProductVariant, SelectedOption,
};

use super::super::queries::{
    RawCollection, RawCollectionConnection, RawMetafield, RawProduct, RawProductConnection,
    RawVariant,
};
use super::{convert_image, convert_money, convert_page_info, convert_seo};

/// JSON stored in the `reviews.rating` metafield by the reviews app.
#[derive(Debug, serde::Deserialize)]
struct RatingMetafieldValue {
    value: String,
    scale_max: String,
}

/// Parse rating metafields into a `ProductRating`.
///
/// Returns `None` when either metafield is missing or malformed, or when the
/// product has no reviews yet.
fn parse_rating_metafields(
    rating: Option<RawMetafield>,
    rating_count: Option<RawMetafield>,
) -> Option<ProductRating> {
    // {"value": "4.3", "scale_min": "1.0", "scale_max": "5.0"}
    let parsed: RatingMetafieldValue = serde_json::from_str(&rating?.value).ok()?;
    let count: i64 = rating_count?.value.trim().parse().ok()?;

    if count == 0 {
        return None;
    }

    Some(ProductRating {
        value: parsed.value.parse().ok()?,
        scale_max: parsed.scale_max.parse().ok()?,
        count,
    })
}

fn convert_variant(variant: RawVariant) -> ProductVariant {
    ProductVariant {
        id: variant.id,
        title: variant.title,
        sku: variant.sku.filter(|s| !s.is_empty()),
        available_for_sale: variant.available_for_sale,
        price: convert_money(variant.price),
        compare_at_price: variant.compare_at_price.map(convert_money),
        selected_options: variant
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
        image: variant.image.map(convert_image),
    }
}

/// Convert a raw product.
pub fn convert_product(product: RawProduct) -> Product {
    let rating = parse_rating_metafields(product.rating, product.rating_count);

    Product {
        id: product.id,
        handle: product.handle,
        title: product.title,
        description: product.description,
        description_html: product.description_html,
        product_type: product.product_type,
        vendor: product.vendor,
        tags: product.tags,
        available_for_sale: product.available_for_sale,
        created_at: product.created_at,
        updated_at: product.updated_at,
        price_range: PriceRange {
            min_variant_price: convert_money(product.price_range.min_variant_price),
            max_variant_price: convert_money(product.price_range.max_variant_price),
        },
        featured_image: product.featured_image.map(convert_image),
        images: product.images.into_nodes().map(convert_image).collect(),
        variants: product.variants.into_nodes().map(convert_variant).collect(),
        seo: convert_seo(product.seo),
        rating,
    }
}

/// Convert a page of products.
pub fn convert_product_connection(conn: RawProductConnection) -> ProductConnection {
    ProductConnection {
        products: conn
            .edges
            .into_iter()
            .map(|e| convert_product(e.node))
            .collect(),
        page_info: convert_page_info(conn.page_info),
    }
}

/// Convert a raw collection, including its products when they were selected.
pub fn convert_collection(collection: RawCollection) -> Collection {
    Collection {
        id: collection.id,
        handle: collection.handle,
        title: collection.title,
        description: collection.description,
        description_html: collection.description_html,
        image: collection.image.map(convert_image),
        seo: convert_seo(collection.seo),
        updated_at: collection.updated_at,
        products: collection
            .products
            .map(|p| p.into_nodes().map(convert_product).collect())
            .unwrap_or_default(),
    }
}

/// Convert a page of collections.
pub fn convert_collection_connection(conn: RawCollectionConnection) -> CollectionConnection {
    CollectionConnection {
        collections: conn
            .edges
            .into_iter()
            .map(|e| convert_collection(e.node))
            .collect(),
        page_info: convert_page_info(conn.page_info),
    }
}
