//! Visitor state kept in the server-side session.

pub mod session;
pub mod wishlist;

pub use session::keys as session_keys;
pub use wishlist::{WISHLIST_LIMIT, Wishlist};

/// Longest accepted product or collection handle.
const MAX_HANDLE_LEN: usize = 255;

/// Whether `handle` looks like a platform handle (`oyster-grow-kit`).
#[must_use]
pub fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle.len() <= MAX_HANDLE_LEN
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_validation() {
        assert!(is_valid_handle("lions-mane-kit_2"));
        assert!(!is_valid_handle(""));
        assert!(!is_valid_handle("../admin"));
        assert!(!is_valid_handle("kit with spaces"));
        assert!(!is_valid_handle(&"a".repeat(256)));
    }
}
