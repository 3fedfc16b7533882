//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (fills the span's `request_id`)
//! 4. CSP nonce (per-request nonce for inline scripts)
//! 5. Security headers (CSP, HSTS, etc.)
//! 6. Session layer (tower-sessions, in memory)
//! 7. Rate limiting on `/api` routes (governor)

pub mod csp;
pub mod customer;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use customer::{CustomerCookies, append_set_cookies, login_cookies, logout_cookies};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter, chat_rate_limiter};
pub use request_id::{RequestId, make_request_span, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
