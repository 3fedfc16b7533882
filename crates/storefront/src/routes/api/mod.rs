//! JSON endpoints backed by caches, the in-memory A/B store and third-party
//! services.

pub mod analytics;
pub mod chat;
pub mod prefetch;
pub mod reviews;
