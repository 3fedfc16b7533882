//! Shopify Storefront API client implementation.
//!
//! Uses hand-written `graphql_client` operations over `reqwest` 0.13.
//! Catalog and content reads are cached with `moka` (5-minute TTL); carts and
//! customer calls always go to the API.

mod cache;
mod conversions;
mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{
    Article, Cart, CartLineInput, CartLineUpdateInput, Collection, CollectionConnection,
    CollectionSort, Customer, CustomerAccessToken, CustomerCreateInput, Product,
    ProductConnection, ProductSortKey,
};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::{CacheKey, CacheValue};
use conversions::{
    cart_from_payload, convert_article, convert_cart, convert_collection,
    convert_collection_connection, convert_customer, convert_product, convert_product_connection,
    join_user_errors,
};
use queries::{
    AccessTokenCreateVariables, AccessTokenVariables, AddToCart, AddToCartVariables,
    ArticleVariables, ArticlesVariables, CartIdVariables, CartInputVariable, CartLineUpdateVariable,
    CartLineVariable, CollectionVariables, CollectionsVariables, CreateCart, CreateCartVariables,
    CredentialsInput, CustomerAccessTokenCreate, CustomerAccessTokenDelete, CustomerCreate,
    CustomerCreateVariables, CustomerInput, GetArticleByHandle, GetArticles, GetCart,
    GetCollectionByHandle, GetCollections, GetCustomer, GetProductByHandle,
    GetProductRecommendations, GetProducts, GetShop, HandleVariables, NoVariables,
    ProductsVariables, RecommendationsVariables, RemoveFromCart, RemoveFromCartVariables,
    UpdateCartLines, UpdateCartLinesVariables,
};

/// Page size used when walking the whole catalog.
const ALL_PRODUCTS_PAGE_SIZE: i64 = 100;
/// Upper bound on pages walked by [`StorefrontClient::get_all_products`].
const ALL_PRODUCTS_MAX_PAGES: usize = 20;
/// Products selected with a collection.
const COLLECTION_PRODUCT_LIMIT: i64 = 100;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    blog_handle: String,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: config.graphql_endpoint(),
                access_token: config.storefront_private_token.expose_secret().to_string(),
                blog_handle: config.blog_handle.clone(),
                cache,
            }),
        }
    }

    /// Handle of the blog backing `/blog` and the RSS feed.
    #[must_use]
    pub fn blog_handle(&self) -> &str {
        &self.inner.blog_handle
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Server-side calls authenticate with the private token header
            .header("Shopify-Storefront-Private-Token", &self.inner.access_token)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first so failures can be logged
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Storefront API returned non-success status"
            );
            return Err(ShopifyError::message(format!(
                "HTTP {status}: {}",
                truncate(&response_text, 200)
            )));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Storefront GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Storefront GraphQL response has no data and no errors"
            );
            ShopifyError::message("No data in response")
        })
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        self.inner.cache.get(&key.as_string()).await
    }

    async fn store(&self, key: &CacheKey, value: CacheValue) {
        self.inner.cache.insert(key.as_string(), value).await;
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no product has this handle, or another error if
    /// the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let key = CacheKey::Product(handle.to_string());

        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data = self
            .execute::<GetProductByHandle>(HandleVariables {
                handle: handle.to_string(),
            })
            .await?;

        let product = data
            .product
            .map(convert_product)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.store(&key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a page of products.
    ///
    /// Only unfiltered, unsorted listings are cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: i64,
        after: Option<String>,
        query: Option<String>,
        sort_key: Option<ProductSortKey>,
        reverse: Option<bool>,
    ) -> Result<ProductConnection, ShopifyError> {
        let cacheable = query.is_none() && sort_key.is_none() && reverse.is_none();
        let key = CacheKey::Products {
            first,
            cursor: after.clone(),
        };

        if cacheable && let Some(CacheValue::Products(products)) = self.cached(&key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let data = self
            .execute::<GetProducts>(ProductsVariables {
                first,
                after,
                query,
                sort_key: sort_key.map(|k| k.as_graphql().to_string()),
                reverse,
            })
            .await?;

        let connection = convert_product_connection(data.products);

        if cacheable {
            self.store(&key, CacheValue::Products(connection.clone()))
                .await;
        }

        Ok(connection)
    }

    /// Walk the catalog and return every product.
    ///
    /// Pages through `products` 100 at a time, stopping after 20 pages.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn get_all_products(&self) -> Result<Vec<Product>, ShopifyError> {
        let mut products = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..ALL_PRODUCTS_MAX_PAGES {
            let connection = self
                .get_products(ALL_PRODUCTS_PAGE_SIZE, cursor.take(), None, None, None)
                .await?;
            products.extend(connection.products);

            match connection.page_info.end_cursor {
                Some(next) if connection.page_info.has_next_page => cursor = Some(next),
                _ => break,
            }

            if page + 1 == ALL_PRODUCTS_MAX_PAGES {
                tracing::warn!(
                    pages = ALL_PRODUCTS_MAX_PAGES,
                    "Catalog walk hit the page limit; remaining products skipped"
                );
            }
        }

        debug!(count = products.len(), "Fetched full catalog");
        Ok(products)
    }

    /// Get product recommendations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_recommendations(
        &self,
        product_id: &str,
    ) -> Result<Vec<Product>, ShopifyError> {
        let data = self
            .execute::<GetProductRecommendations>(RecommendationsVariables {
                product_id: product_id.to_string(),
            })
            .await?;

        Ok(data
            .product_recommendations
            .map(|recs| recs.into_iter().map(convert_product).collect())
            .unwrap_or_default())
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get a collection and its products.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no collection has this handle, or another error
    /// if the API request fails.
    #[instrument(skip(self), fields(handle = %handle, sort = sort.as_param()))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        sort: CollectionSort,
    ) -> Result<Collection, ShopifyError> {
        let key = CacheKey::Collection {
            handle: handle.to_string(),
            sort: sort.as_param(),
            first: COLLECTION_PRODUCT_LIMIT,
        };

        if let Some(CacheValue::Collection(collection)) = self.cached(&key).await {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let (sort_key, reverse) = sort.as_graphql();
        let data = self
            .execute::<GetCollectionByHandle>(CollectionVariables {
                handle: handle.to_string(),
                first: COLLECTION_PRODUCT_LIMIT,
                sort_key: sort_key.to_string(),
                reverse,
            })
            .await?;

        let collection = data
            .collection
            .map(convert_collection)
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;

        self.store(&key, CacheValue::Collection(Box::new(collection.clone())))
            .await;

        Ok(collection)
    }

    /// Get a page of collections (without their products).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<CollectionConnection, ShopifyError> {
        let key = CacheKey::Collections {
            first,
            cursor: after.clone(),
        };

        if let Some(CacheValue::Collections(collections)) = self.cached(&key).await {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let data = self
            .execute::<GetCollections>(CollectionsVariables { first, after })
            .await?;

        let connection = convert_collection_connection(data.collections);

        self.store(&key, CacheValue::Collections(connection.clone()))
            .await;

        Ok(connection)
    }

    // =========================================================================
    // Blog Methods
    // =========================================================================

    /// Get the newest articles of the configured blog, newest first.
    ///
    /// A missing blog yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_articles(&self, first: i64) -> Result<Vec<Article>, ShopifyError> {
        let key = CacheKey::Articles(first);

        if let Some(CacheValue::Articles(articles)) = self.cached(&key).await {
            debug!("Cache hit for articles");
            return Ok(articles);
        }

        let data = self
            .execute::<GetArticles>(ArticlesVariables {
                blog_handle: self.inner.blog_handle.clone(),
                first,
            })
            .await?;

        let articles: Vec<Article> = data
            .blog
            .map(|blog| blog.articles.into_nodes().map(convert_article).collect())
            .unwrap_or_default();

        self.store(&key, CacheValue::Articles(articles.clone()))
            .await;

        Ok(articles)
    }

    /// Get an article by blog and article handle.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the blog or article does not exist, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(blog = %blog_handle, handle = %handle))]
    pub async fn get_article_by_handle(
        &self,
        blog_handle: &str,
        handle: &str,
    ) -> Result<Article, ShopifyError> {
        let data = self
            .execute::<GetArticleByHandle>(ArticleVariables {
                blog_handle: blog_handle.to_string(),
                handle: handle.to_string(),
            })
            .await?;

        data.blog
            .and_then(|blog| blog.article_by_handle)
            .map(convert_article)
            .ok_or_else(|| ShopifyError::NotFound(format!("Article not found: {handle}")))
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a cart, optionally with initial lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines))]
    pub async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<CreateCart>(CreateCartVariables {
                input: CartInputVariable {
                    lines: lines.into_iter().map(line_variable).collect(),
                },
            })
            .await?;

        cart_from_payload(data.cart_create, "Failed to create cart")
    }

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the cart no longer exists (expired or completed),
    /// or another error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<GetCart>(CartIdVariables {
                cart_id: cart_id.to_string(),
            })
            .await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<AddToCart>(AddToCartVariables {
                cart_id: cart_id.to_string(),
                lines: lines.into_iter().map(line_variable).collect(),
            })
            .await?;

        cart_from_payload(data.cart_lines_add, "Failed to add to cart")
    }

    /// Change quantities of existing cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartLines>(UpdateCartLinesVariables {
                cart_id: cart_id.to_string(),
                lines: lines
                    .into_iter()
                    .map(|line| CartLineUpdateVariable {
                        id: line.id,
                        quantity: line.quantity,
                    })
                    .collect(),
            })
            .await?;

        cart_from_payload(data.cart_lines_update, "Failed to update cart")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<RemoveFromCart>(RemoveFromCartVariables {
                cart_id: cart_id.to_string(),
                line_ids,
            })
            .await?;

        cart_from_payload(data.cart_lines_remove, "Failed to remove from cart")
    }

    // =========================================================================
    // Customer Methods
    // =========================================================================

    /// Exchange email and password for a customer access token.
    ///
    /// # Errors
    ///
    /// Returns `UserError` for rejected credentials, or another error if the
    /// API request fails.
    #[instrument(skip(self, password))]
    pub async fn create_customer_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let data = self
            .execute::<CustomerAccessTokenCreate>(AccessTokenCreateVariables {
                input: CredentialsInput {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            })
            .await?;

        let payload = data
            .customer_access_token_create
            .ok_or_else(|| ShopifyError::message("Failed to create access token"))?;

        if let Some(message) = join_user_errors(&payload.customer_user_errors) {
            return Err(ShopifyError::UserError(message));
        }

        payload
            .customer_access_token
            .map(|t| CustomerAccessToken {
                access_token: t.access_token,
                expires_at: t.expires_at,
            })
            // The platform returns neither token nor errors for unknown emails
            .ok_or_else(|| ShopifyError::UserError("Unidentified customer".to_string()))
    }

    /// Revoke a customer access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, access_token))]
    pub async fn delete_customer_access_token(
        &self,
        access_token: &str,
    ) -> Result<(), ShopifyError> {
        let data = self
            .execute::<CustomerAccessTokenDelete>(AccessTokenVariables {
                customer_access_token: access_token.to_string(),
            })
            .await?;

        let payload = data
            .customer_access_token_delete
            .ok_or_else(|| ShopifyError::message("Failed to delete access token"))?;

        if let Some(message) = join_user_errors(&payload.user_errors) {
            return Err(ShopifyError::UserError(message));
        }

        debug!(
            deleted = payload.deleted_access_token.is_some(),
            "Customer access token revoked"
        );
        Ok(())
    }

    /// Register a customer and return the new customer's ID.
    ///
    /// # Errors
    ///
    /// Returns `UserError` when the platform rejects the input (taken email,
    /// weak password), or another error if the API request fails.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(
        &self,
        input: CustomerCreateInput,
    ) -> Result<String, ShopifyError> {
        let data = self
            .execute::<CustomerCreate>(CustomerCreateVariables {
                input: CustomerInput {
                    email: input.email,
                    password: input.password,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    accepts_marketing: input.accepts_marketing,
                },
            })
            .await?;

        let payload = data
            .customer_create
            .ok_or_else(|| ShopifyError::message("Failed to create customer"))?;

        if let Some(message) = join_user_errors(&payload.customer_user_errors) {
            return Err(ShopifyError::UserError(message));
        }

        payload
            .customer
            .map(|c| c.id)
            .ok_or_else(|| ShopifyError::message("Failed to create customer"))
    }

    /// Look up the customer behind an access token.
    ///
    /// Returns `None` for expired or revoked tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access_token))]
    pub async fn get_customer(&self, access_token: &str) -> Result<Option<Customer>, ShopifyError> {
        let data = self
            .execute::<GetCustomer>(AccessTokenVariables {
                customer_access_token: access_token.to_string(),
            })
            .await?;

        Ok(data.customer.map(convert_customer))
    }

    /// Shop name; used as a cheap connectivity check.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_shop_name(&self) -> Result<String, ShopifyError> {
        let data = self.execute::<GetShop>(NoVariables::default()).await?;
        Ok(data.shop.name)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Drop a cached product so the next lookup hits the API.
    pub async fn invalidate_product(&self, handle: &str) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(handle.to_string()).as_string())
            .await;
    }

    /// Drop every cached catalog and content entry.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

fn line_variable(line: CartLineInput) -> CartLineVariable {
    CartLineVariable {
        merchandise_id: line.merchandise_id,
        quantity: line.quantity,
    }
}

fn convert_graphql_error(error: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: error.message,
        locations: error
            .locations
            .unwrap_or_default()
            .into_iter()
            .map(|l| GraphQLErrorLocation {
                line: i64::from(l.line),
                column: i64::from(l.column),
            })
            .collect(),
        path: error
            .path
            .unwrap_or_default()
            .into_iter()
            .map(|fragment| match fragment {
                graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
            })
            .collect(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
