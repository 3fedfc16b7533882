//! Cached catalog behind the search routes.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::instrument;

use crate::shopify::{Product, StorefrontClient};

use super::{ProductHit, SearchParams, SearchResults, search_products};

/// Most suggestions returned for a partial query.
pub const SUGGESTION_LIMIT: usize = 5;

/// How long the catalog is reused between searches.
const CATALOG_TTL: Duration = Duration::from_secs(60);

/// Searches the full catalog, fetched through the Storefront client.
///
/// The catalog is memoised under a single key for 60 seconds. Concurrent
/// searches while it is loading wait for the same fetch.
#[derive(Clone)]
pub struct SearchService {
    client: StorefrontClient,
    catalog: Cache<(), Arc<Vec<Product>>>,
}

impl SearchService {
    /// Create a search service over a Storefront client.
    #[must_use]
    pub fn new(client: StorefrontClient) -> Self {
        Self {
            client,
            catalog: Cache::builder()
                .max_capacity(1)
                .time_to_live(CATALOG_TTL)
                .build(),
        }
    }

    /// The full catalog, or an empty list when the Storefront API fails.
    pub async fn catalog(&self) -> Arc<Vec<Product>> {
        let client = self.client.clone();
        let result = self
            .catalog
            .try_get_with((), async move { client.get_all_products().await.map(Arc::new) })
            .await;

        match result {
            Ok(products) => products,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load catalog for search");
                Arc::new(Vec::new())
            }
        }
    }

    /// Run a search against the cached catalog.
    #[instrument(skip(self), fields(q = %params.q))]
    pub async fn get_search_data(&self, params: &SearchParams) -> SearchResults {
        let catalog = self.catalog().await;
        let results = search_products(&catalog, params);
        tracing::debug!(total = results.total, "Search complete");
        results
    }

    /// Typeahead suggestions for a partial query.
    pub async fn suggest(&self, q: &str) -> Vec<ProductHit> {
        if q.trim().is_empty() {
            return Vec::new();
        }

        let params = SearchParams {
            per_page: Some(SUGGESTION_LIMIT),
            ..SearchParams::query(q)
        };
        let catalog = self.catalog().await;
        search_products(&catalog, &params)
            .products
            .iter()
            .map(ProductHit::from)
            .collect()
    }

    /// Seed the catalog without a fetch.
    #[cfg(test)]
    pub async fn prime(&self, products: Vec<Product>) {
        self.catalog.insert((), Arc::new(products)).await;
    }
}
