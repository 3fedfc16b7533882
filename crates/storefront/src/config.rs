//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., sporeline.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PRIVATE_TOKEN` - Storefront API private access token
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_SITE_NAME` - Display name (default: Sporeline Mycology Supply)
//! - `SHOPIFY_API_VERSION` - API version (default: 2025-01)
//! - `SHOPIFY_STOREFRONT_ENDPOINT` - Full GraphQL endpoint override
//! - `SHOPIFY_BLOG_HANDLE` - Blog used for articles and the RSS feed (default: news)
//! - `REVIEWS_API_URL` - Reviews API base URL (default: <https://judge.me/api/v1>)
//! - `REVIEWS_API_TOKEN` - Reviews API bearer token (reviews disabled if unset)
//! - `REVIEWS_SHOP_DOMAIN` - Shop domain sent to the reviews API (default: `SHOPIFY_STORE`)
//! - `CHAT_API_KEY` - LLM API key (chat disabled if unset)
//! - `CHAT_MODEL` - LLM model name
//! - `CHAT_API_URL` - LLM messages endpoint
//! - `AUTH_COOKIE_TTL_DAYS` - Lifetime of customer auth cookies (default: 30)
//! - `PREFETCH_CACHE_TTL_SECS` - Image prefetch cache TTL (default: 300)
//! - `GA4_MEASUREMENT_ID` - Google Analytics 4 measurement ID
//! - `META_PIXEL_ID` - Meta (Facebook) pixel ID
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_CHAT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_CHAT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_REVIEWS_API_URL: &str = "https://judge.me/api/v1";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront, without trailing slash
    pub base_url: String,
    /// Display name used in titles, feeds and social cards
    pub site_name: String,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Third-party reviews API configuration
    pub reviews: Option<ReviewsConfig>,
    /// LLM chat API configuration
    pub chat: Option<ChatConfig>,
    /// Customer auth cookie names and lifetimes
    pub auth_cookies: AuthCookieConfig,
    /// Image prefetch cache lifetime
    pub prefetch_ttl: Duration,
    /// Analytics tracking configuration
    pub analytics: AnalyticsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors reported to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of requests traced in Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., sporeline.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2025-01)
    pub api_version: String,
    /// Explicit GraphQL endpoint; derived from store and version when unset
    pub endpoint: Option<String>,
    /// Storefront API private access token (server-side only)
    pub storefront_private_token: SecretString,
    /// Handle of the blog that backs `/blog` and the RSS feed
    pub blog_handle: String,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("endpoint", &self.endpoint)
            .field("storefront_private_token", &"[REDACTED]")
            .field("blog_handle", &self.blog_handle)
            .finish()
    }
}

impl ShopifyStorefrontConfig {
    /// GraphQL endpoint URL.
    #[must_use]
    pub fn graphql_endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{}/api/{}/graphql.json",
                self.store, self.api_version
            )
        })
    }
}

/// Reviews API configuration.
#[derive(Clone)]
pub struct ReviewsConfig {
    /// API base URL, without trailing slash
    pub api_url: String,
    /// Bearer token injected into proxied requests
    pub api_token: SecretString,
    /// Shop domain the reviews provider knows the store by
    pub shop_domain: String,
}

impl std::fmt::Debug for ReviewsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewsConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &"[REDACTED]")
            .field("shop_domain", &self.shop_domain)
            .finish()
    }
}

/// LLM chat API configuration.
#[derive(Clone)]
pub struct ChatConfig {
    /// Messages endpoint
    pub api_url: String,
    /// API key
    pub api_key: SecretString,
    /// Model name
    pub model: String,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Name and lifetime of one cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSpec {
    /// Cookie name
    pub name: &'static str,
    /// Lifetime
    pub max_age: Duration,
    /// Hidden from page scripts
    pub http_only: bool,
}

/// The four cookies that carry a logged-in customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCookieConfig {
    /// Platform customer access token
    pub access_token: CookieSpec,
    /// RFC 3339 expiry of the access token
    pub expires_at: CookieSpec,
    /// Customer email, for prefilling forms
    pub customer_email: CookieSpec,
    /// `true` flag the page scripts read to toggle account UI
    pub logged_in: CookieSpec,
}

impl AuthCookieConfig {
    /// Default cookie lifetime in days.
    pub const DEFAULT_TTL_DAYS: u64 = 30;

    /// Cookie set with every lifetime equal to `ttl`.
    #[must_use]
    pub const fn with_ttl(ttl: Duration) -> Self {
        Self {
            access_token: CookieSpec {
                name: "customer_access_token",
                max_age: ttl,
                http_only: true,
            },
            expires_at: CookieSpec {
                name: "customer_token_expires_at",
                max_age: ttl,
                http_only: true,
            },
            customer_email: CookieSpec {
                name: "customer_email",
                max_age: ttl,
                http_only: true,
            },
            logged_in: CookieSpec {
                name: "customer_logged_in",
                max_age: ttl,
                http_only: false,
            },
        }
    }

    /// All four cookie specs, in a fixed order.
    #[must_use]
    pub const fn all(&self) -> [&CookieSpec; 4] {
        [
            &self.access_token,
            &self.expires_at,
            &self.customer_email,
            &self.logged_in,
        ]
    }
}

impl Default for AuthCookieConfig {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(Self::DEFAULT_TTL_DAYS * 24 * 60 * 60))
    }
}

/// Analytics and tracking tag configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsConfig {
    /// Google Analytics 4 measurement ID
    pub ga4_measurement_id: Option<String>,
    /// Meta (Facebook) pixel ID
    pub meta_pixel_id: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = normalize_base_url(&get_required_env("STOREFRONT_BASE_URL")?)?;
        let site_name = get_env_or_default("STOREFRONT_SITE_NAME", "Sporeline Mycology Supply");

        let shopify = ShopifyStorefrontConfig::from_env()?;
        let reviews = ReviewsConfig::from_env(&shopify.store)?;
        let chat = ChatConfig::from_env()?;

        let ttl_days: u64 = parse_env(
            "AUTH_COOKIE_TTL_DAYS",
            &AuthCookieConfig::DEFAULT_TTL_DAYS.to_string(),
        )?;
        let auth_cookies = AuthCookieConfig::with_ttl(Duration::from_secs(ttl_days * 24 * 60 * 60));

        let prefetch_ttl = Duration::from_secs(parse_env("PREFETCH_CACHE_TTL_SECS", "300")?);

        Ok(Self {
            host,
            port,
            base_url,
            site_name,
            shopify,
            reviews,
            chat,
            auth_cookies,
            prefetch_ttl,
            analytics: AnalyticsConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Absolute URL for a site path (`/products/x` → `https://…/products/x`).
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl ShopifyStorefrontConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2025-01"),
            endpoint: get_optional_env("SHOPIFY_STOREFRONT_ENDPOINT"),
            storefront_private_token: get_validated_secret("SHOPIFY_STOREFRONT_PRIVATE_TOKEN")?,
            blog_handle: get_env_or_default("SHOPIFY_BLOG_HANDLE", "news"),
        })
    }
}

impl ReviewsConfig {
    fn from_env(store: &str) -> Result<Option<Self>, ConfigError> {
        if get_optional_env("REVIEWS_API_TOKEN").is_none() {
            return Ok(None);
        }

        Ok(Some(Self {
            api_url: get_env_or_default("REVIEWS_API_URL", DEFAULT_REVIEWS_API_URL)
                .trim_end_matches('/')
                .to_string(),
            api_token: get_validated_secret("REVIEWS_API_TOKEN")?,
            shop_domain: get_env_or_default("REVIEWS_SHOP_DOMAIN", store),
        }))
    }
}

impl ChatConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        if get_optional_env("CHAT_API_KEY").is_none() {
            return Ok(None);
        }

        Ok(Some(Self {
            api_url: get_env_or_default("CHAT_API_URL", DEFAULT_CHAT_API_URL),
            api_key: get_validated_secret("CHAT_API_KEY")?,
            model: get_env_or_default("CHAT_MODEL", DEFAULT_CHAT_MODEL),
        }))
    }
}

impl AnalyticsConfig {
    fn from_env() -> Self {
        Self {
            ga4_measurement_id: get_optional_env("GA4_MEASUREMENT_ID"),
            meta_pixel_id: get_optional_env("META_PIXEL_ID"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate the base URL and strip any trailing slash.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
    })?;

    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_BASE_URL".to_string(),
            "must include a host".to_string(),
        ));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API tokens are random; low entropy means a hand-typed value
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration pointing every upstream at a closed local port.
    pub fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            site_name: "Sporeline Mycology Supply".to_string(),
            shopify: ShopifyStorefrontConfig {
                store: "sporeline-test.myshopify.com".to_string(),
                api_version: "2025-01".to_string(),
                endpoint: Some("http://127.0.0.1:9/graphql.json".to_string()),
                storefront_private_token: SecretString::from("shpat_test_token"),
                blog_handle: "news".to_string(),
            },
            reviews: None,
            chat: None,
            auth_cookies: AuthCookieConfig::default(),
            prefetch_ttl: Duration::from_secs(300),
            analytics: AnalyticsConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Configuration pointing the Storefront, reviews and chat APIs at a
    /// local stub served from `base`.
    pub fn test_config_with_upstream(base: &str) -> StorefrontConfig {
        let mut config = test_config();
        config.shopify.endpoint = Some(format!("{base}/graphql.json"));
        config.reviews = Some(ReviewsConfig {
            api_url: format!("{base}/reviews-api"),
            api_token: SecretString::from("reviews_test_token"),
            shop_domain: "sporeline-test.myshopify.com".to_string(),
        });
        config.chat = Some(ChatConfig {
            api_url: format!("{base}/v1/messages"),
            api_key: SecretString::from("chat_test_key"),
            model: "claude-test".to_string(),
        });
        config
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-storefront-token", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("shpat_9f3Kq2LmX8vR4tYz1bN7cW5e", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_normalize_base_url_strips_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://sporeline.shop/").unwrap(),
            "https://sporeline.shop"
        );
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_socket_addr_and_urls() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
        assert_eq!(
            config.absolute_url("/products/oyster-kit"),
            "http://localhost:3000/products/oyster-kit"
        );
        assert_eq!(
            config.absolute_url("blog"),
            "http://localhost:3000/blog"
        );
    }

    #[test]
    fn test_graphql_endpoint_default() {
        let mut shopify = test_config().shopify;
        shopify.endpoint = None;
        assert_eq!(
            shopify.graphql_endpoint(),
            "https://sporeline-test.myshopify.com/api/2025-01/graphql.json"
        );
    }

    #[test]
    fn test_auth_cookie_defaults() {
        let cookies = AuthCookieConfig::default();
        let names: Vec<_> = cookies.all().iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "customer_access_token",
                "customer_token_expires_at",
                "customer_email",
                "customer_logged_in"
            ]
        );
        assert_eq!(
            cookies.access_token.max_age,
            Duration::from_secs(30 * 24 * 60 * 60)
        );
        assert!(!cookies.logged_in.http_only);
        assert!(cookies.access_token.http_only);
    }

    #[test]
    fn test_secret_configs_debug_redacts() {
        let reviews = ReviewsConfig {
            api_url: DEFAULT_REVIEWS_API_URL.to_string(),
            api_token: SecretString::from("super_secret_reviews_token"),
            shop_domain: "sporeline-test.myshopify.com".to_string(),
        };
        let chat = ChatConfig {
            api_url: DEFAULT_CHAT_API_URL.to_string(),
            api_key: SecretString::from("super_secret_chat_key"),
            model: DEFAULT_CHAT_MODEL.to_string(),
        };
        let shopify = test_config().shopify;

        let output = format!("{reviews:?} {chat:?} {shopify:?}");
        assert!(output.contains("[REDACTED]"));
        assert!(output.contains("sporeline-test.myshopify.com"));
        assert!(!output.contains("super_secret_reviews_token"));
        assert!(!output.contains("super_secret_chat_key"));
        assert!(!output.contains("shpat_test_token"));
    }
}
