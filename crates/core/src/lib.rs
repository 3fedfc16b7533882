//! Sporeline Core - Shared types library.
//!
//! This crate provides common types used by the storefront and its tests:
//! - `storefront` - Public-facing mushroom cultivation supply shop
//! - `integration-tests` - Smoke tests against a running storefront
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps it
//! lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Validated wrappers for commerce IDs, prices, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
