//! Wishlist of product handles.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session_keys;

/// Most handles kept; adding beyond this drops the oldest.
pub const WISHLIST_LIMIT: usize = 100;

/// Product handles, most recently added first, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist(Vec<String>);

impl Wishlist {
    /// Move `handle` to the front, adding it if absent.
    pub fn add(&mut self, handle: &str) {
        self.0.retain(|h| h != handle);
        self.0.insert(0, handle.to_string());
        self.0.truncate(WISHLIST_LIMIT);
    }

    /// Remove `handle`; returns whether it was present.
    pub fn remove(&mut self, handle: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|h| h != handle);
        self.0.len() != before
    }

    #[must_use]
    pub fn contains(&self, handle: &str) -> bool {
        self.0.iter().any(|h| h == handle)
    }

    #[must_use]
    pub fn handles(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Load from the session; a missing or unreadable entry is an empty list.
    pub async fn load(session: &Session) -> Self {
        session
            .get::<Self>(session_keys::WISHLIST)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Store in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::WISHLIST, self).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_most_recent_first_without_duplicates() {
        let mut wishlist = Wishlist::default();
        wishlist.add("oyster-kit");
        wishlist.add("agar-plates");
        wishlist.add("oyster-kit");

        assert_eq!(wishlist.handles(), ["oyster-kit", "agar-plates"]);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut wishlist = Wishlist::default();
        for i in 0..=WISHLIST_LIMIT {
            wishlist.add(&format!("kit-{i}"));
        }

        assert_eq!(wishlist.len(), WISHLIST_LIMIT);
        assert_eq!(wishlist.handles()[0], format!("kit-{WISHLIST_LIMIT}"));
        assert!(!wishlist.contains("kit-0"));
        assert!(wishlist.contains("kit-1"));
    }

    #[test]
    fn test_remove() {
        let mut wishlist = Wishlist::default();
        wishlist.add("reishi-kit");
        assert!(wishlist.remove("reishi-kit"));
        assert!(!wishlist.remove("reishi-kit"));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let mut wishlist = Wishlist::default();
        wishlist.add("a");
        wishlist.add("b");
        assert_eq!(serde_json::to_value(&wishlist).unwrap(), serde_json::json!(["b", "a"]));
    }
}
