//! Application state shared across handlers.

use std::sync::Arc;

use crate::analytics::AbTestStore;
use crate::config::StorefrontConfig;
use crate::prefetch::PrefetchCache;
use crate::search::SearchService;
use crate::services::{ChatClient, ChatError, ReviewsClient, ReviewsError};
use crate::shopify::StorefrontClient;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("reviews client: {0}")]
    Reviews(#[from] ReviewsError),
    #[error("chat client: {0}")]
    Chat(#[from] ChatError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the upstream clients and the in-memory
/// caches; nothing here is persisted.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    search: SearchService,
    prefetch: PrefetchCache,
    ab_tests: AbTestStore,
    reviews: Option<ReviewsClient>,
    chat: Option<ChatClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Reviews and chat clients are only built when configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured reviews or chat client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let storefront = StorefrontClient::new(&config.shopify);
        let search = SearchService::new(storefront.clone());
        let prefetch = PrefetchCache::new(config.prefetch_ttl);
        let reviews = config.reviews.as_ref().map(ReviewsClient::new).transpose()?;
        let chat = config.chat.as_ref().map(ChatClient::new).transpose()?;

        if reviews.is_none() {
            tracing::info!("Reviews API not configured; review routes will answer 503");
        }
        if chat.is_none() {
            tracing::info!("Chat API not configured; chat route will answer 503");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                search,
                prefetch,
                ab_tests: AbTestStore::new(),
                reviews,
                chat,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    #[must_use]
    pub fn search(&self) -> &SearchService {
        &self.inner.search
    }

    /// Coalescing cache behind `/api/prefetch-images`.
    #[must_use]
    pub fn prefetch(&self) -> &PrefetchCache {
        &self.inner.prefetch
    }

    #[must_use]
    pub fn ab_tests(&self) -> &AbTestStore {
        &self.inner.ab_tests
    }

    /// Reviews client, if configured.
    #[must_use]
    pub fn reviews(&self) -> Option<&ReviewsClient> {
        self.inner.reviews.as_ref()
    }

    /// Chat client, if configured.
    #[must_use]
    pub fn chat(&self) -> Option<&ChatClient> {
        self.inner.chat.as_ref()
    }
}
