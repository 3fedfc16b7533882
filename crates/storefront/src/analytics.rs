//! In-memory A/B test event store.
//!
//! Storefront experiments report impressions and conversions from the browser.
//! Events live in a bounded ring buffer; once it holds [`AB_EVENT_CAPACITY`]
//! events each insert evicts the oldest one. Nothing is persisted.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most events retained.
pub const AB_EVENT_CAPACITY: usize = 10_000;

/// Longest accepted test, variant or session id.
pub const MAX_ID_LEN: usize = 128;

/// Kind of A/B event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbEventKind {
    Impression,
    Conversion,
}

/// A recorded A/B event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbTestEvent {
    pub test_id: String,
    pub variant: String,
    pub event: AbEventKind,
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Event as posted by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAbTestEvent {
    pub test_id: String,
    pub variant: String,
    pub event: AbEventKind,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl NewAbTestEvent {
    /// Validate ids and stamp the event with the current time.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<AbTestEvent, String> {
        let test_id = validate_id("test_id", &self.test_id)?;
        let variant = validate_id("variant", &self.variant)?;
        let session_id = match self.session_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(id) => Some(validate_id("session_id", id)?),
        };

        Ok(AbTestEvent {
            test_id,
            variant,
            event: self.event,
            session_id,
            timestamp: Utc::now(),
        })
    }
}

fn validate_id(field: &str, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > MAX_ID_LEN {
        return Err(format!("{field} must be at most {MAX_ID_LEN} characters"));
    }
    Ok(value.to_string())
}

/// Counts for one variant of a test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantSummary {
    pub variant: String,
    pub impressions: u64,
    pub conversions: u64,
    pub conversion_rate: f64,
}

/// Per-variant counts for one test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub test_id: String,
    pub variants: Vec<VariantSummary>,
}

/// Bounded event buffer shared between handlers.
#[derive(Clone)]
pub struct AbTestStore {
    events: Arc<RwLock<VecDeque<AbTestEvent>>>,
    capacity: usize,
}

impl Default for AbTestStore {
    fn default() -> Self {
        Self::with_capacity(AB_EVENT_CAPACITY)
    }
}

impl AbTestStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding at most `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity: capacity.max(1),
        }
    }

    /// Append an event, evicting the oldest when full.
    pub fn record(&self, event: AbTestEvent) {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-test, per-variant counts, sorted by test id then variant.
    #[must_use]
    pub fn summary(&self, test_id: Option<&str>) -> Vec<TestSummary> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);

        let mut counts: BTreeMap<&str, BTreeMap<&str, (u64, u64)>> = BTreeMap::new();
        for event in events
            .iter()
            .filter(|e| test_id.is_none_or(|id| e.test_id == id))
        {
            let entry = counts
                .entry(event.test_id.as_str())
                .or_default()
                .entry(event.variant.as_str())
                .or_default();
            match event.event {
                AbEventKind::Impression => entry.0 += 1,
                AbEventKind::Conversion => entry.1 += 1,
            }
        }

        counts
            .into_iter()
            .map(|(test_id, variants)| TestSummary {
                test_id: test_id.to_string(),
                variants: variants
                    .into_iter()
                    .map(|(variant, (impressions, conversions))| VariantSummary {
                        variant: variant.to_string(),
                        impressions,
                        conversions,
                        conversion_rate: conversion_rate(impressions, conversions),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Remove events for one test, or all events. Returns how many were removed.
    pub fn clear(&self, test_id: Option<&str>) -> usize {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        let before = events.len();
        match test_id {
            Some(id) => events.retain(|e| e.test_id != id),
            None => events.clear(),
        }
        before - events.len()
    }
}

#[allow(clippy::cast_precision_loss)]
fn conversion_rate(impressions: u64, conversions: u64) -> f64 {
    if impressions == 0 {
        0.0
    } else {
        conversions as f64 / impressions as f64
    }
}
