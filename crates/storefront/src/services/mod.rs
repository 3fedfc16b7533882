//! Clients for third-party services the storefront proxies.
//!
//! - [`reviews`] - product reviews provider
//! - [`chat`] - LLM grow assistant

pub mod chat;
pub mod reviews;

pub use chat::{ChatClient, ChatError};
pub use reviews::{ReviewsClient, ReviewsError};
