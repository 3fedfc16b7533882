//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw GraphQL
//! response shapes in `storefront::queries`. Templates, JSON handlers, feeds
//! and search all work with these.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sporeline_core::Price;

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Parsed price, or `None` for amounts or currencies the shop can't price in.
    #[must_use]
    pub fn price(&self) -> Option<Price> {
        Price::parse(&self.amount, &self.currency_code).ok()
    }

    /// Parsed decimal amount.
    #[must_use]
    pub fn decimal(&self) -> Option<Decimal> {
        self.price().map(|p| p.amount)
    }

    /// Display string (`$24.50`), falling back to `24.5 USD`.
    #[must_use]
    pub fn display(&self) -> String {
        self.price().map_or_else(
            || format!("{} {}", self.amount, self.currency_code),
            |p| p.display(),
        )
    }
}

/// Price range for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Minimum price among all variants.
    pub min_variant_price: Money,
    /// Maximum price among all variants.
    pub max_variant_price: Money,
}

// =============================================================================
// Image / SEO / Rating
// =============================================================================

/// Product, collection or article image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL on the platform CDN.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

/// SEO metadata set in the platform admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seo {
    /// Page title for search engines.
    pub title: Option<String>,
    /// Meta description.
    pub description: Option<String>,
}

/// Aggregate rating published by the reviews app as product metafields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRating {
    /// Average rating value (e.g., 4.5).
    pub value: f64,
    /// Maximum of the rating scale (typically 5.0).
    pub scale_max: f64,
    /// Total number of reviews.
    pub count: i64,
}

// =============================================================================
// Product Types
// =============================================================================

/// A selected option on a variant (e.g., Size: 5 lb).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name.
    pub name: String,
    /// Option value.
    pub value: String,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant global ID (the cart merchandise id).
    pub id: String,
    /// Variant title (e.g., "5 lb / Sterilized").
    pub title: String,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Whether the variant can currently be bought.
    pub available_for_sale: bool,
    /// Current price.
    pub price: Money,
    /// Original price when on sale.
    pub compare_at_price: Option<Money>,
    /// Option values that identify this variant.
    pub selected_options: Vec<SelectedOption>,
    /// Variant-specific image.
    pub image: Option<Image>,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product global ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain-text description.
    pub description: String,
    /// HTML description.
    pub description_html: String,
    /// Product type (e.g., "Grow Kit").
    pub product_type: String,
    /// Vendor name.
    pub vendor: String,
    /// Merchandising tags.
    pub tags: Vec<String>,
    /// Whether any variant can be bought.
    pub available_for_sale: bool,
    /// Creation timestamp (RFC 3339).
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    pub updated_at: Option<String>,
    /// Min and max variant prices.
    pub price_range: PriceRange,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// Product images, featured first.
    pub images: Vec<Image>,
    /// Variants.
    pub variants: Vec<ProductVariant>,
    /// SEO overrides.
    pub seo: Seo,
    /// Aggregate review rating, when the product has reviews.
    pub rating: Option<ProductRating>,
}

impl Product {
    /// Minimum variant price as a decimal.
    #[must_use]
    pub fn min_price(&self) -> Option<Decimal> {
        self.price_range.min_variant_price.decimal()
    }

    /// Whether the product or any of its variants is in stock.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available_for_sale || self.variants.iter().any(|v| v.available_for_sale)
    }

    /// Display price, prefixed with "From" when variants differ.
    #[must_use]
    pub fn price_display(&self) -> String {
        let min = &self.price_range.min_variant_price;
        let max = &self.price_range.max_variant_price;
        if min.decimal().is_some() && min.decimal() != max.decimal() {
            format!("From {}", min.display())
        } else {
            min.display()
        }
    }

    /// The first variant that can be added to the cart.
    #[must_use]
    pub fn default_variant(&self) -> Option<&ProductVariant> {
        self.variants
            .iter()
            .find(|v| v.available_for_sale)
            .or_else(|| self.variants.first())
    }

    /// Featured image, falling back to the first gallery image.
    #[must_use]
    pub fn primary_image(&self) -> Option<&Image> {
        self.featured_image.as_ref().or_else(|| self.images.first())
    }
}

// =============================================================================
// Collection Types
// =============================================================================

/// A collection of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection global ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Plain-text description.
    pub description: String,
    /// HTML description.
    pub description_html: String,
    /// Collection image.
    pub image: Option<Image>,
    /// SEO overrides.
    pub seo: Seo,
    /// Last update timestamp (RFC 3339).
    pub updated_at: Option<String>,
    /// Products in the collection (empty for list queries).
    pub products: Vec<Product>,
}

/// Pagination info.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Cursor for the next page.
    pub end_cursor: Option<String>,
}

/// Paginated products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConnection {
    /// Products on this page.
    pub products: Vec<Product>,
    /// Pagination info.
    pub page_info: PageInfo,
}

/// Paginated collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConnection {
    /// Collections on this page.
    pub collections: Vec<Collection>,
    /// Pagination info.
    pub page_info: PageInfo,
}

// =============================================================================
// Content Types
// =============================================================================

/// A blog article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Article global ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Article title.
    pub title: String,
    /// Plain-text excerpt.
    pub excerpt: Option<String>,
    /// Full HTML body.
    pub content_html: String,
    /// Publication timestamp (RFC 3339).
    pub published_at: String,
    /// Author display name.
    pub author_name: Option<String>,
    /// Hero image.
    pub image: Option<Image>,
    /// Tags.
    pub tags: Vec<String>,
    /// SEO overrides.
    pub seo: Seo,
}

impl Article {
    /// Excerpt, falling back to the first 200 characters of the body text.
    #[must_use]
    pub fn summary(&self) -> String {
        if let Some(excerpt) = self.excerpt.as_deref().filter(|e| !e.trim().is_empty()) {
            return excerpt.trim().to_string();
        }
        strip_tags(&self.content_html).chars().take(200).collect()
    }
}

/// Remove HTML tags and collapse whitespace.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// Cart Types
// =============================================================================

/// Merchandise (variant) referenced by a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant global ID.
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Parent product title.
    pub product_title: String,
    /// Parent product handle.
    pub product_handle: String,
    /// Variant price.
    pub price: Money,
    /// Variant or product image.
    pub image: Option<Image>,
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line global ID.
    pub id: String,
    /// Quantity.
    pub quantity: i64,
    /// What the line is for.
    pub merchandise: CartMerchandise,
    /// Line total after discounts.
    pub total: Money,
}

/// Cart totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before taxes and shipping.
    pub subtotal: Money,
    /// Estimated total.
    pub total: Money,
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart global ID.
    pub id: String,
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Sum of line quantities.
    pub total_quantity: i64,
    /// Totals.
    pub cost: CartCost,
    /// Lines.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Input for adding a line to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Variant global ID.
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: i64,
}

/// Input for changing an existing cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Line global ID.
    pub id: String,
    /// New quantity (0 removes the line).
    pub quantity: i64,
}

// =============================================================================
// Customer Types
// =============================================================================

/// A logged-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer global ID.
    pub id: String,
    /// Email address.
    pub email: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Display name chosen by the platform.
    pub display_name: String,
}

/// A customer access token issued on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAccessToken {
    /// Opaque token.
    pub access_token: String,
    /// Expiry timestamp (RFC 3339).
    pub expires_at: String,
}

/// Input for registering a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCreateInput {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Newsletter opt-in.
    pub accepts_marketing: bool,
}

// =============================================================================
// Sort Keys
// =============================================================================

/// Sort keys for the top-level products query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductSortKey {
    Title,
    Price,
    CreatedAt,
    BestSelling,
    UpdatedAt,
}

impl ProductSortKey {
    /// GraphQL enum value.
    #[must_use]
    pub const fn as_graphql(self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::Price => "PRICE",
            Self::CreatedAt => "CREATED_AT",
            Self::BestSelling => "BEST_SELLING",
            Self::UpdatedAt => "UPDATED_AT",
        }
    }
}

/// Sort options offered on collection pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionSort {
    /// Merchandiser's manual order.
    #[default]
    Featured,
    BestSelling,
    PriceAsc,
    PriceDesc,
    TitleAsc,
    TitleDesc,
    Newest,
}

impl CollectionSort {
    /// Every option, in menu order.
    pub const ALL: [Self; 7] = [
        Self::Featured,
        Self::BestSelling,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::TitleAsc,
        Self::TitleDesc,
        Self::Newest,
    ];

    /// Parse a query-string value, defaulting to `Featured`.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| Some(s.as_param()) == value)
            .unwrap_or_default()
    }

    /// Query-string value.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::BestSelling => "best-selling",
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
            Self::Featured => "Featured",
            Self::BestSelling => "Best selling",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::TitleAsc => "Name: A to Z",
            Self::TitleDesc => "Name: Z to A",
            Self::Newest => "Newest",
        }
    }

    /// `ProductCollectionSortKeys` value and `reverse` flag.
    #[must_use]
    pub const fn as_graphql(self) -> (&'static str, bool) {
        match self {
            Self::Featured => ("COLLECTION_DEFAULT", false),
            Self::BestSelling => ("BEST_SELLING", false),
            Self::PriceAsc => ("PRICE", false),
            Self::PriceDesc => ("PRICE", true),
            Self::TitleAsc => ("TITLE", false),
            Self::TitleDesc => ("TITLE", true),
            Self::Newest => ("CREATED", true),
        }
    }
}
