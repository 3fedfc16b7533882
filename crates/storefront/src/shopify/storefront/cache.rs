//! Cache types for Storefront API responses.

use crate::shopify::types::{Article, Collection, CollectionConnection, Product, ProductConnection};

/// Cache key for catalog and content queries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(String),
    Products { first: i64, cursor: Option<String> },
    Collection { handle: String, sort: &'static str, first: i64 },
    Collections { first: i64, cursor: Option<String> },
    Articles(i64),
}

impl CacheKey {
    /// String form used as the moka key (`product:{handle}`, ...).
    pub fn as_string(&self) -> String {
        match self {
            Self::Product(handle) => format!("product:{handle}"),
            Self::Products { first, cursor } => {
                format!("products:{first}:{}", cursor.as_deref().unwrap_or(""))
            }
            Self::Collection {
                handle,
                sort,
                first,
            } => format!("collection:{handle}:{sort}:{first}"),
            Self::Collections { first, cursor } => {
                format!("collections:{first}:{}", cursor.as_deref().unwrap_or(""))
            }
            Self::Articles(first) => format!("articles:{first}"),
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductConnection),
    Collection(Box<Collection>),
    Collections(CollectionConnection),
    Articles(Vec<Article>),
}
