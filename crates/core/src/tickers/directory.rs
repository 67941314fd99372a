use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use super::symbol::normalize_symbol;
use super::tickers_model::{NewTickerEntry, TickerEntry};
use super::tickers_traits::TickerStore;
use crate::errors::{DatabaseError, Error, Result};

/// Shared name/symbol → ticker table.
///
/// Writers never pre-check before inserting. Two requests resolving the same
/// unknown name may both try to insert; the unique key on `symbol` lets one
/// win and [`insert_or_get`](Self::insert_or_get) hands the loser the winner's row.
pub struct TickerDirectory {
    store: Arc<dyn TickerStore>,
}

impl TickerDirectory {
    pub fn new(store: Arc<dyn TickerStore>) -> Self {
        Self { store }
    }

    pub fn find_by_symbol(&self, symbol: &str) -> Result<Option<TickerEntry>> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Ok(None);
        }
        self.store.find_by_symbol(&symbol)
    }

    pub fn find_by_name_like(&self, fragment: &str) -> Result<Option<TickerEntry>> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Ok(None);
        }
        self.store.find_by_name_like(fragment)
    }

    /// Exact symbol first, then company-name substring.
    pub fn lookup(&self, query: &str) -> Result<Option<TickerEntry>> {
        if let Some(entry) = self.find_by_symbol(query)? {
            return Ok(Some(entry));
        }
        self.find_by_name_like(query)
    }

    /// Insert `entry`, or return the existing row if another writer got there first.
    pub async fn insert_or_get(&self, entry: NewTickerEntry) -> Result<TickerEntry> {
        let entry = entry.normalized();
        if entry.symbol.is_empty() {
            return Err(Error::Validation("ticker symbol must not be empty".to_string()));
        }
        let symbol = entry.symbol.clone();

        match self.store.insert(entry).await {
            Ok(inserted) => {
                debug!("Ticker directory: inserted {}", inserted.symbol);
                Ok(inserted)
            }
            Err(e) if e.is_unique_violation() => {
                debug!("Ticker directory: {} inserted concurrently, re-reading", symbol);
                self.store.find_by_symbol(&symbol)?.ok_or_else(|| {
                    Error::Database(DatabaseError::NotFound(format!(
                        "ticker {} vanished after a duplicate-key insert",
                        symbol
                    )))
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Bulk insert/refine keyed on symbol.
    ///
    /// Blank symbols are skipped; duplicates within the batch collapse to the
    /// last occurrence.
    pub async fn upsert_many(&self, entries: Vec<NewTickerEntry>) -> Result<usize> {
        let mut by_symbol: HashMap<String, NewTickerEntry> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for entry in entries.into_iter().map(NewTickerEntry::normalized) {
            if entry.symbol.is_empty() {
                warn!("Ticker directory: skipping entry without symbol ({})", entry.company_name);
                continue;
            }
            if !by_symbol.contains_key(&entry.symbol) {
                order.push(entry.symbol.clone());
            }
            by_symbol.insert(entry.symbol.clone(), entry);
        }

        let batch: Vec<NewTickerEntry> = order
            .into_iter()
            .filter_map(|symbol| by_symbol.remove(&symbol))
            .collect();
        if batch.is_empty() {
            return Ok(0);
        }
        self.store.upsert_many(batch).await
    }
}
