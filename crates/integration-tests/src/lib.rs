//! Smoke tests for a running Sporeline storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the storefront against a development store
//! cargo run -p sporeline-storefront
//!
//! # Run the ignored smoke tests against it
//! STOREFRONT_URL=http://localhost:3000 cargo test -p sporeline-integration-tests -- --ignored
//! ```
//!
//! Every test is `#[ignore]` so a plain `cargo test` never needs a server.

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// HTTP client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}
