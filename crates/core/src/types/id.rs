//! Shopify global IDs.
//!
//! The commerce platform identifies every resource with a URI of the form
//! `gid://shopify/{Resource}/{id}`. Third-party services (reviews, analytics)
//! usually want the bare numeric `{id}` instead.

use core::fmt;

use serde::{Deserialize, Serialize};

const GID_PREFIX: &str = "gid://shopify/";

/// Errors from parsing a [`ShopifyGid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GidError {
    /// Input does not start with `gid://shopify/`.
    #[error("not a shopify global id: {0}")]
    MissingPrefix(String),
    /// Missing resource or id segment.
    #[error("malformed global id: {0}")]
    Malformed(String),
    /// Resource segment is not the one the caller expected.
    #[error("expected a {expected} id, got {actual}")]
    WrongResource {
        /// Resource the caller asked for.
        expected: String,
        /// Resource found in the id.
        actual: String,
    },
    /// The id segment is not numeric.
    #[error("id is not numeric: {0}")]
    NotNumeric(String),
}

/// A parsed Shopify global ID such as `gid://shopify/Product/123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShopifyGid {
    resource: String,
    id: String,
}

impl ShopifyGid {
    /// Build a global ID from its parts.
    #[must_use]
    pub fn new(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Parse a `gid://shopify/{Resource}/{id}` string.
    ///
    /// Query strings some endpoints append (`?cart_key=…`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GidError::MissingPrefix`] or [`GidError::Malformed`] when the
    /// input is not a well-formed global ID.
    pub fn parse(input: &str) -> Result<Self, GidError> {
        let rest = input
            .trim()
            .strip_prefix(GID_PREFIX)
            .ok_or_else(|| GidError::MissingPrefix(input.to_string()))?;
        let rest = rest.split('?').next().unwrap_or_default();

        let (resource, id) = rest
            .split_once('/')
            .ok_or_else(|| GidError::Malformed(input.to_string()))?;

        if resource.is_empty() || id.is_empty() || id.contains('/') {
            return Err(GidError::Malformed(input.to_string()));
        }

        Ok(Self::new(resource, id))
    }

    /// Normalize a product identifier to its numeric form.
    ///
    /// Accepts either `gid://shopify/Product/{id}` or a bare numeric id.
    ///
    /// ```
    /// use sporeline_core::ShopifyGid;
    ///
    /// assert_eq!(
    ///     ShopifyGid::numeric_product_id("gid://shopify/Product/8312345").unwrap(),
    ///     "8312345"
    /// );
    /// assert_eq!(ShopifyGid::numeric_product_id("8312345").unwrap(), "8312345");
    /// assert!(ShopifyGid::numeric_product_id("gid://shopify/Collection/1").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`GidError`] if the input is neither form or the id is not
    /// numeric.
    pub fn numeric_product_id(input: &str) -> Result<String, GidError> {
        let trimmed = input.trim();
        if is_numeric(trimmed) {
            return Ok(trimmed.to_string());
        }

        let gid = Self::parse(trimmed)?;
        if gid.resource != "Product" {
            return Err(GidError::WrongResource {
                expected: "Product".to_string(),
                actual: gid.resource,
            });
        }
        if !is_numeric(&gid.id) {
            return Err(GidError::NotNumeric(gid.id));
        }
        Ok(gid.id)
    }

    /// Resource name (e.g. `Product`, `ProductVariant`).
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Resource-local id segment.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ShopifyGid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{GID_PREFIX}{}/{}", self.resource, self.id)
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_gid() {
        let gid = ShopifyGid::parse("gid://shopify/Product/7982345").unwrap();
        assert_eq!(gid.resource(), "Product");
        assert_eq!(gid.id(), "7982345");
        assert_eq!(gid.to_string(), "gid://shopify/Product/7982345");
    }

    #[test]
    fn test_parse_ignores_query_string() {
        let gid = ShopifyGid::parse("gid://shopify/Cart/c1-abc?key=xyz").unwrap();
        assert_eq!(gid.resource(), "Cart");
        assert_eq!(gid.id(), "c1-abc");
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert!(matches!(
            ShopifyGid::parse("https://shopify/Product/1"),
            Err(GidError::MissingPrefix(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://shopify/Product"),
            Err(GidError::Malformed(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://shopify/Product/1/2"),
            Err(GidError::Malformed(_))
        ));
    }

    #[test]
    fn test_numeric_product_id_from_gid() {
        assert_eq!(
            ShopifyGid::numeric_product_id("gid://shopify/Product/42").unwrap(),
            "42"
        );
    }

    #[test]
    fn test_numeric_product_id_passthrough() {
        assert_eq!(ShopifyGid::numeric_product_id(" 42 ").unwrap(), "42");
    }

    #[test]
    fn test_numeric_product_id_rejects_variants() {
        let err = ShopifyGid::numeric_product_id("gid://shopify/ProductVariant/42").unwrap_err();
        assert_eq!(
            err,
            GidError::WrongResource {
                expected: "Product".to_string(),
                actual: "ProductVariant".to_string(),
            }
        );
    }

    #[test]
    fn test_numeric_product_id_rejects_non_numeric() {
        assert!(matches!(
            ShopifyGid::numeric_product_id("gid://shopify/Product/abc"),
            Err(GidError::NotNumeric(_))
        ));
        assert!(ShopifyGid::numeric_product_id("lions-mane-grow-kit").is_err());
        assert!(ShopifyGid::numeric_product_id("").is_err());
    }
}
