//! GraphQL operations for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] with its
//! variables and the raw response shape. Shared selections are kept as
//! fragments and spliced into each document at compile time.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

// =============================================================================
// Fragments
// =============================================================================

macro_rules! image_fields {
    () => {
        "fragment ImageFields on Image { url altText width height }\n"
    };
}

macro_rules! money_fields {
    () => {
        "fragment MoneyFields on MoneyV2 { amount currencyCode }\n"
    };
}

macro_rules! product_fields {
    () => {
        r#"
fragment ProductFields on Product {
  id
  handle
  title
  description
  descriptionHtml
  productType
  vendor
  tags
  availableForSale
  createdAt
  updatedAt
  seo { title description }
  priceRange {
    minVariantPrice { ...MoneyFields }
    maxVariantPrice { ...MoneyFields }
  }
  featuredImage { ...ImageFields }
  images(first: 10) { edges { node { ...ImageFields } } }
  variants(first: 50) {
    edges {
      node {
        id
        title
        sku
        availableForSale
        price { ...MoneyFields }
        compareAtPrice { ...MoneyFields }
        selectedOptions { name value }
        image { ...ImageFields }
      }
    }
  }
  rating: metafield(namespace: "reviews", key: "rating") { value }
  ratingCount: metafield(namespace: "reviews", key: "rating_count") { value }
}
"#
    };
}

macro_rules! collection_fields {
    () => {
        r#"
fragment CollectionFields on Collection {
  id
  handle
  title
  description
  descriptionHtml
  updatedAt
  image { ...ImageFields }
  seo { title description }
}
"#
    };
}

macro_rules! article_fields {
    () => {
        r#"
fragment ArticleFields on Article {
  id
  handle
  title
  excerpt
  contentHtml
  publishedAt
  tags
  authorV2 { name }
  image { ...ImageFields }
  seo { title description }
}
"#
    };
}

macro_rules! cart_fields {
    () => {
        r#"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount { ...MoneyFields }
    totalAmount { ...MoneyFields }
  }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        cost { totalAmount { ...MoneyFields } }
        merchandise {
          ... on ProductVariant {
            id
            title
            price { ...MoneyFields }
            image { ...ImageFields }
            product { title handle featuredImage { ...ImageFields } }
          }
        }
      }
    }
  }
}
"#
    };
}

/// Declare an operation struct and its `GraphQLQuery` impl.
macro_rules! graphql_operation {
    ($name:ident, $op:literal, $vars:ty, $data:ty, $query:expr) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $vars;
            type ResponseData = $data;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $query,
                    operation_name: $op,
                }
            }
        }
    };
}

// =============================================================================
// Raw response shapes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Edges<T> {
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Edges<T> {
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImage {
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMoney {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSeo {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMetafield {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceRange {
    pub min_variant_price: RawMoney,
    pub max_variant_price: RawMoney,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSelectedOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariant {
    pub id: String,
    pub title: String,
    pub sku: Option<String>,
    pub available_for_sale: bool,
    pub price: RawMoney,
    pub compare_at_price: Option<RawMoney>,
    #[serde(default)]
    pub selected_options: Vec<RawSelectedOption>,
    pub image: Option<RawImage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_html: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub available_for_sale: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub seo: RawSeo,
    pub price_range: RawPriceRange,
    pub featured_image: Option<RawImage>,
    pub images: Edges<RawImage>,
    pub variants: Edges<RawVariant>,
    pub rating: Option<RawMetafield>,
    pub rating_count: Option<RawMetafield>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductConnection {
    pub edges: Vec<Edge<RawProduct>>,
    pub page_info: RawPageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCollection {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_html: String,
    pub updated_at: Option<String>,
    pub image: Option<RawImage>,
    #[serde(default)]
    pub seo: RawSeo,
    pub products: Option<Edges<RawProduct>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCollectionConnection {
    pub edges: Vec<Edge<RawCollection>>,
    pub page_info: RawPageInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthor {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content_html: String,
    pub published_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "authorV2")]
    pub author: Option<RawAuthor>,
    pub image: Option<RawImage>,
    #[serde(default)]
    pub seo: RawSeo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartProduct {
    pub title: String,
    pub handle: String,
    pub featured_image: Option<RawImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMerchandise {
    pub id: String,
    pub title: String,
    pub price: RawMoney,
    pub image: Option<RawImage>,
    pub product: RawCartProduct,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLineCost {
    pub total_amount: RawMoney,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCartLine {
    pub id: String,
    pub quantity: i64,
    pub cost: RawLineCost,
    pub merchandise: RawMerchandise,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartCost {
    pub subtotal_amount: RawMoney,
    pub total_amount: RawMoney,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCart {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: RawCartCost,
    pub lines: Edges<RawCartLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartPayload {
    pub cart: Option<RawCart>,
    #[serde(default)]
    pub user_errors: Vec<RawUserError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccessToken {
    pub access_token: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCustomer {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: String,
}

// =============================================================================
// Variables
// =============================================================================

/// Variables for operations that take none; serializes as `{}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoVariables {}

#[derive(Debug, Clone, Serialize)]
pub struct HandleVariables {
    pub handle: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsVariables {
    pub first: i64,
    pub after: Option<String>,
    pub query: Option<String>,
    pub sort_key: Option<String>,
    pub reverse: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsVariables {
    pub product_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionVariables {
    pub handle: String,
    pub first: i64,
    pub sort_key: String,
    pub reverse: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionsVariables {
    pub first: i64,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesVariables {
    pub blog_handle: String,
    pub first: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleVariables {
    pub blog_handle: String,
    pub handle: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineVariable {
    pub merchandise_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineUpdateVariable {
    pub id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartInputVariable {
    pub lines: Vec<CartLineVariable>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCartVariables {
    pub input: CartInputVariable,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartIdVariables {
    pub cart_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartVariables {
    pub cart_id: String,
    pub lines: Vec<CartLineVariable>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartLinesVariables {
    pub cart_id: String,
    pub lines: Vec<CartLineUpdateVariable>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartVariables {
    pub cart_id: String,
    pub line_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialsInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenCreateVariables {
    pub input: CredentialsInput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenVariables {
    pub customer_access_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub accepts_marketing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerCreateVariables {
    pub input: CustomerInput,
}

// =============================================================================
// Response data
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ProductByHandleData {
    pub product: Option<RawProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsData {
    pub products: RawProductConnection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsData {
    pub product_recommendations: Option<Vec<RawProduct>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionByHandleData {
    pub collection: Option<RawCollection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionsData {
    pub collections: RawCollectionConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogArticles {
    pub articles: Edges<RawArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticlesData {
    pub blog: Option<BlogArticles>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogArticle {
    pub article_by_handle: Option<RawArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleByHandleData {
    pub blog: Option<BlogArticle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartData {
    pub cart_create: Option<RawCartPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetCartData {
    pub cart: Option<RawCart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartData {
    pub cart_lines_add: Option<RawCartPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartLinesData {
    pub cart_lines_update: Option<RawCartPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartData {
    pub cart_lines_remove: Option<RawCartPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenCreatePayload {
    pub customer_access_token: Option<RawAccessToken>,
    #[serde(default)]
    pub customer_user_errors: Vec<RawUserError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenCreateData {
    pub customer_access_token_create: Option<AccessTokenCreatePayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenDeletePayload {
    pub deleted_access_token: Option<String>,
    #[serde(default)]
    pub user_errors: Vec<RawUserError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenDeleteData {
    pub customer_access_token_delete: Option<AccessTokenDeletePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedCustomer {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreatePayload {
    pub customer: Option<CreatedCustomer>,
    #[serde(default)]
    pub customer_user_errors: Vec<RawUserError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreateData {
    pub customer_create: Option<CustomerCreatePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerData {
    pub customer: Option<RawCustomer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawShop {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopData {
    pub shop: RawShop,
}

// =============================================================================
// Operations
// =============================================================================

graphql_operation!(
    GetProductByHandle,
    "GetProductByHandle",
    HandleVariables,
    ProductByHandleData,
    concat!(
        "query GetProductByHandle($handle: String!) { product(handle: $handle) { ...ProductFields } }\n",
        product_fields!(),
        image_fields!(),
        money_fields!()
    )
);

graphql_operation!(
    GetProducts,
    "GetProducts",
    ProductsVariables,
    ProductsData,
    concat!(
        r#"
query GetProducts($first: Int!, $after: String, $query: String, $sortKey: ProductSortKeys, $reverse: Boolean) {
  products(first: $first, after: $after, query: $query, sortKey: $sortKey, reverse: $reverse) {
    edges { node { ...ProductFields } }
    pageInfo { hasNextPage endCursor }
  }
}
"#,
        product_fields!(),
        image_fields!(),
        money_fields!()
    )
);

graphql_operation!(
    GetProductRecommendations,
    "GetProductRecommendations",
    RecommendationsVariables,
    RecommendationsData,
    concat!(
        "query GetProductRecommendations($productId: ID!) { productRecommendations(productId: $productId) { ...ProductFields } }\n",
        product_fields!(),
        image_fields!(),
        money_fields!()
    )
);

graphql_operation!(
    GetCollectionByHandle,
    "GetCollectionByHandle",
    CollectionVariables,
    CollectionByHandleData,
    concat!(
        r#"
query GetCollectionByHandle($handle: String!, $first: Int!, $sortKey: ProductCollectionSortKeys, $reverse: Boolean) {
  collection(handle: $handle) {
    ...CollectionFields
    products(first: $first, sortKey: $sortKey, reverse: $reverse) {
      edges { node { ...ProductFields } }
    }
  }
}
"#,
        collection_fields!(),
        product_fields!(),
        image_fields!(),
        money_fields!()
    )
);

graphql_operation!(
    GetCollections,
    "GetCollections",
    CollectionsVariables,
    CollectionsData,
    concat!(
        r#"
query GetCollections($first: Int!, $after: String) {
  collections(first: $first, after: $after) {
    edges { node { ...CollectionFields } }
    pageInfo { hasNextPage endCursor }
  }
}
"#,
        collection_fields!(),
        image_fields!()
    )
);

graphql_operation!(
    GetArticles,
    "GetArticles",
    ArticlesVariables,
    ArticlesData,
    concat!(
        r#"
query GetArticles($blogHandle: String!, $first: Int!) {
  blog(handle: $blogHandle) {
    articles(first: $first, sortKey: PUBLISHED_AT, reverse: true) {
      edges { node { ...ArticleFields } }
    }
  }
}
"#,
        article_fields!(),
        image_fields!()
    )
);

graphql_operation!(
    GetArticleByHandle,
    "GetArticleByHandle",
    ArticleVariables,
    ArticleByHandleData,
    concat!(
        r#"
query GetArticleByHandle($blogHandle: String!, $handle: String!) {
  blog(handle: $blogHandle) {
    articleByHandle(handle: $handle) { ...ArticleFields }
  }
}
"#,
        article_fields!(),
        image_fields!()
    )
);

graphql_operation!(
    CreateCart,
    "CreateCart",
    CreateCartVariables,
    CreateCartData,
    concat!(
        r#"
mutation CreateCart($input: CartInput!) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
"#,
        cart_fields!(),
        image_fields!(),
        money_fields!()
    )
);

graphql_operation!(
    GetCart,
    "GetCart",
    CartIdVariables,
    GetCartData,
    concat!(
        "query GetCart($cartId: ID!) { cart(id: $cartId) { ...CartFields } }\n",
        cart_fields!(),
        image_fields!(),
        money_fields!()
    )
);

graphql_operation!(
    AddToCart,
    "AddToCart",
    AddToCartVariables,
    AddToCartData,
    concat!(
        r#"
mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
"#,
        cart_fields!(),
        image_fields!(),
        money_fields!()
    )
);

graphql_operation!(
    UpdateCartLines,
    "UpdateCartLines",
    UpdateCartLinesVariables,
    UpdateCartLinesData,
    concat!(
        r#"
mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
"#,
        cart_fields!(),
        image_fields!(),
        money_fields!()
    )
);

graphql_operation!(
    RemoveFromCart,
    "RemoveFromCart",
    RemoveFromCartVariables,
    RemoveFromCartData,
    concat!(
        r#"
mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
"#,
        cart_fields!(),
        image_fields!(),
        money_fields!()
    )
);

graphql_operation!(
    CustomerAccessTokenCreate,
    "CustomerAccessTokenCreate",
    AccessTokenCreateVariables,
    AccessTokenCreateData,
    r#"
mutation CustomerAccessTokenCreate($input: CustomerAccessTokenCreateInput!) {
  customerAccessTokenCreate(input: $input) {
    customerAccessToken { accessToken expiresAt }
    customerUserErrors { field message }
  }
}
"#
);

graphql_operation!(
    CustomerAccessTokenDelete,
    "CustomerAccessTokenDelete",
    AccessTokenVariables,
    AccessTokenDeleteData,
    r#"
mutation CustomerAccessTokenDelete($customerAccessToken: String!) {
  customerAccessTokenDelete(customerAccessToken: $customerAccessToken) {
    deletedAccessToken
    userErrors { field message }
  }
}
"#
);

graphql_operation!(
    CustomerCreate,
    "CustomerCreate",
    CustomerCreateVariables,
    CustomerCreateData,
    r#"
mutation CustomerCreate($input: CustomerCreateInput!) {
  customerCreate(input: $input) {
    customer { id }
    customerUserErrors { field message }
  }
}
"#
);

graphql_operation!(
    GetCustomer,
    "GetCustomer",
    AccessTokenVariables,
    CustomerData,
    r#"
query GetCustomer($customerAccessToken: String!) {
  customer(customerAccessToken: $customerAccessToken) {
    id
    email
    firstName
    lastName
    displayName
  }
}
"#
);

graphql_operation!(
    GetShop,
    "GetShop",
    NoVariables,
    ShopData,
    "query GetShop { shop { name } }"
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_documents_include_fragments() {
        let body = GetProductByHandle::build_query(HandleVariables {
            handle: "oyster-grow-kit".to_string(),
        });
        assert_eq!(body.operation_name, "GetProductByHandle");
        assert!(body.query.contains("fragment ProductFields on Product"));
        assert!(body.query.contains("fragment ImageFields on Image"));
        assert!(body.query.contains("fragment MoneyFields on MoneyV2"));

        let cart = GetCart::build_query(CartIdVariables {
            cart_id: "gid://shopify/Cart/1".to_string(),
        });
        assert!(cart.query.contains("fragment CartFields on Cart"));
    }

    #[test]
    fn test_variables_serialize_camel_case() {
        let body = GetCollectionByHandle::build_query(CollectionVariables {
            handle: "grain-spawn".to_string(),
            first: 24,
            sort_key: "PRICE".to_string(),
            reverse: true,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["operationName"], "GetCollectionByHandle");
        assert_eq!(json["variables"]["sortKey"], "PRICE");
        assert_eq!(json["variables"]["reverse"], true);

        let shop = serde_json::to_value(GetShop::build_query(NoVariables::default())).unwrap();
        assert_eq!(shop["variables"], serde_json::json!({}));
    }

    #[test]
    fn test_cart_payload_deserializes() {
        let json = serde_json::json!({
            "cartLinesAdd": {
                "cart": null,
                "userErrors": [{ "field": ["lines", "0"], "message": "Variant is sold out" }]
            }
        });
        let data: AddToCartData = serde_json::from_value(json).unwrap();
        let payload = data.cart_lines_add.unwrap();
        assert!(payload.cart.is_none());
        assert_eq!(payload.user_errors.len(), 1);
        assert_eq!(payload.user_errors[0].message, "Variant is sold out");
    }
}
