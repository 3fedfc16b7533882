//! Coalescing cache behind the image-prefetch endpoint.
//!
//! Product cards warm the browser cache by asking for the images of a product
//! or collection before the visitor navigates. Results are kept for a fixed
//! TTL under `type:handle`, and concurrent requests for the same key share a
//! single upstream fetch. Failed fetches are never cached.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tracing::instrument;

use crate::shopify::{CollectionSort, Image, ShopifyError, StorefrontClient};

/// Most images returned for one key.
pub const MAX_PREFETCH_IMAGES: usize = 8;

/// What the images belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchKind {
    Product,
    Collection,
}

impl PrefetchKind {
    /// Parse the `type` query parameter.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "product" => Some(Self::Product),
            "collection" => Some(Self::Collection),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Collection => "collection",
        }
    }
}

/// An image as sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefetchImage {
    pub url: String,
    pub alt: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl From<&Image> for PrefetchImage {
    fn from(image: &Image) -> Self {
        Self {
            url: image.url.clone(),
            alt: image.alt_text.clone().unwrap_or_default(),
            width: image.width,
            height: image.height,
        }
    }
}

/// Cache key for a kind and handle.
#[must_use]
pub fn cache_key(kind: PrefetchKind, handle: &str) -> String {
    format!("{}:{handle}", kind.as_str())
}

/// TTL cache of image lists with in-flight request coalescing.
#[derive(Clone)]
pub struct PrefetchCache {
    images: Cache<String, Arc<Vec<PrefetchImage>>>,
}

impl PrefetchCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            images: Cache::builder()
                .max_capacity(2_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Return the cached images for a key, or run `fetch` once to load them.
    ///
    /// Callers arriving while a fetch for the same key is in flight wait for
    /// that fetch instead of starting their own.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, shared between every caller that waited on it.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        kind: PrefetchKind,
        handle: &str,
        fetch: F,
    ) -> Result<Arc<Vec<PrefetchImage>>, Arc<ShopifyError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<PrefetchImage>, ShopifyError>>,
    {
        let key = cache_key(kind, handle);
        self.images
            .try_get_with(key, async move {
                let mut images = fetch().await?;
                images.truncate(MAX_PREFETCH_IMAGES);
                Ok(Arc::new(images))
            })
            .await
    }

    /// Images for a product or collection, loaded through the Storefront client.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown handles, or another error if the API
    /// request fails.
    #[instrument(skip(self, client), fields(kind = kind.as_str(), handle = %handle))]
    pub async fn images(
        &self,
        client: &StorefrontClient,
        kind: PrefetchKind,
        handle: &str,
    ) -> Result<Arc<Vec<PrefetchImage>>, Arc<ShopifyError>> {
        let client = client.clone();
        let owned_handle = handle.to_string();
        self.get_or_fetch(kind, handle, move || async move {
            tracing::debug!("Prefetch cache miss");
            match kind {
                PrefetchKind::Product => {
                    let product = client.get_product_by_handle(&owned_handle).await?;
                    Ok(product.images.iter().map(PrefetchImage::from).collect())
                }
                PrefetchKind::Collection => {
                    let collection = client
                        .get_collection_by_handle(&owned_handle, CollectionSort::default())
                        .await?;
                    Ok(collection
                        .image
                        .iter()
                        .chain(collection.products.iter().filter_map(|p| p.primary_image()))
                        .map(PrefetchImage::from)
                        .collect())
                }
            }
        })
        .await
    }

    #[cfg(test)]
    async fn entry_count(&self) -> u64 {
        self.images.run_pending_tasks().await;
        self.images.entry_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::test_support::image;

    fn images(n: usize) -> Vec<PrefetchImage> {
        (0..n)
            .map(|i| PrefetchImage::from(&image(&format!("shiitake-{i}"))))
            .collect()
    }

    #[test]
    fn test_kind_and_key() {
        assert_eq!(PrefetchKind::parse("product"), Some(PrefetchKind::Product));
        assert_eq!(
            PrefetchKind::parse("collection"),
            Some(PrefetchKind::Collection)
        );
        assert_eq!(PrefetchKind::parse("article"), None);
        assert_eq!(
            cache_key(PrefetchKind::Product, "lions-mane-kit"),
            "product:lions-mane-kit"
        );
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache = PrefetchCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_fetch(PrefetchKind::Product, "oyster-kit", || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok(images(3))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let result = task.await.unwrap().unwrap();
            assert_eq!(result.len(), 3);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_fetch() {
        let cache = PrefetchCache::new(Duration::from_secs(300));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            cache
                .get_or_fetch(PrefetchKind::Collection, "grain-spawn", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(images(2))
                })
                .await
                .unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_kinds_do_not_share_entries() {
        let cache = PrefetchCache::new(Duration::from_secs(300));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for kind in [PrefetchKind::Product, PrefetchKind::Collection] {
            cache
                .get_or_fetch(kind, "reishi", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(images(1))
                })
                .await
                .unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = PrefetchCache::new(Duration::from_secs(300));

        let err = cache
            .get_or_fetch(PrefetchKind::Product, "missing", || async {
                Err(ShopifyError::NotFound("Product not found: missing".to_string()))
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(cache.entry_count().await, 0);

        let ok = cache
            .get_or_fetch(PrefetchKind::Product, "missing", || async { Ok(images(1)) })
            .await
            .unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[tokio::test]
    async fn test_truncates_to_limit() {
        let cache = PrefetchCache::new(Duration::from_secs(300));
        let result = cache
            .get_or_fetch(PrefetchKind::Product, "agar-sampler", || async {
                Ok(images(20))
            })
            .await
            .unwrap();
        assert_eq!(result.len(), MAX_PREFETCH_IMAGES);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = PrefetchCache::new(Duration::from_millis(50));
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(images(1))
        };

        cache
            .get_or_fetch(PrefetchKind::Product, "tek", fetch)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        cache
            .get_or_fetch(PrefetchKind::Product, "tek", fetch)
            .await
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
