//! Per-process quote cache keyed by resolved ticker.
//!
//! Entries are overwritten on every successful fetch and never evicted.
//! Once older than the TTL they are only served as a degraded fallback.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::warn;

use crate::models::{CachedQuote, NormalizedQuote};

#[derive(Default)]
pub struct QuoteCache {
    entries: Mutex<HashMap<String, CachedQuote>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CachedQuote>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Quote cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn key(symbol: &str) -> String {
        symbol.trim().to_uppercase()
    }

    /// Cached entry for `symbol`, fresh or stale.
    pub fn get(&self, symbol: &str) -> Option<CachedQuote> {
        self.lock_entries().get(&Self::key(symbol)).cloned()
    }

    pub fn put(&self, symbol: &str, data: NormalizedQuote, fetched_at: DateTime<Utc>) {
        self.lock_entries()
            .insert(Self::key(symbol), CachedQuote::new(data, fetched_at));
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }
}
