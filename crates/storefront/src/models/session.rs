//! Session-related types.

/// Session keys for visitor state.
pub mod keys {
    /// Key for the Storefront API cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the wishlist handles.
    pub const WISHLIST: &str = "wishlist";
}
