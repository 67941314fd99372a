//! Hand-written doubles for the storage, reasoning and provider seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moneta_market_data::{
    AlphaVantageProvider, MarketDataError, NormalizedQuote, QuoteProvider, RateLimit,
};
use rust_decimal::Decimal;
use tokio::sync::Barrier;

use crate::errors::{DatabaseError, Error, ResolveError, Result};
use crate::prices::{PriceCacheEntry, PriceSink, PriceStore, PriceUpdate};
use crate::tickers::{NewTickerEntry, ReasoningClient, TickerEntry, TickerStore};

// =========================================================================
// MockTickerStore
// =========================================================================

/// In-memory store that enforces the unique key on `symbol`.
#[derive(Default)]
pub(crate) struct MockTickerStore {
    rows: Mutex<Vec<TickerEntry>>,
    pub(crate) inserts: Mutex<usize>,
    /// Symbols whose insert reports a duplicate without writing, to
    /// simulate a row disappearing between the insert and the re-read.
    pub(crate) phantom_duplicates: Mutex<Vec<String>>,
}

impl MockTickerStore {
    pub(crate) fn with_rows(rows: Vec<NewTickerEntry>) -> Self {
        let store = Self::default();
        {
            let mut stored = store.rows.lock().unwrap();
            for (i, row) in rows.into_iter().enumerate() {
                stored.push(Self::materialize(i as i64 + 1, row.normalized()));
            }
        }
        store
    }

    fn materialize(id: i64, entry: NewTickerEntry) -> TickerEntry {
        let now = Utc::now();
        TickerEntry {
            id,
            symbol: entry.symbol,
            company_name: entry.company_name,
            sector: entry.sector,
            industry: entry.industry,
            static_description: entry.static_description,
            static_pe_ratio: entry.static_pe_ratio,
            competitors: entry.competitors,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn rows(&self) -> Vec<TickerEntry> {
        self.rows.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, symbol: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.symbol == symbol)
            .count()
    }
}

#[async_trait]
impl TickerStore for MockTickerStore {
    fn find_by_symbol(&self, symbol: &str) -> Result<Option<TickerEntry>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.symbol == symbol)
            .cloned())
    }

    fn find_by_name_like(&self, fragment: &str) -> Result<Option<TickerEntry>> {
        let needle = fragment.to_lowercase();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.company_name.to_lowercase().contains(&needle))
            .cloned())
    }

    async fn insert(&self, entry: NewTickerEntry) -> Result<TickerEntry> {
        *self.inserts.lock().unwrap() += 1;
        if self.phantom_duplicates.lock().unwrap().contains(&entry.symbol) {
            return Err(DatabaseError::UniqueViolation(entry.symbol).into());
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.symbol == entry.symbol) {
            return Err(DatabaseError::UniqueViolation(entry.symbol).into());
        }
        let row = Self::materialize(rows.len() as i64 + 1, entry);
        rows.push(row.clone());
        Ok(row)
    }

    async fn upsert_many(&self, entries: Vec<NewTickerEntry>) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        let count = entries.len();
        for entry in entries {
            match rows.iter_mut().find(|r| r.symbol == entry.symbol) {
                Some(existing) => {
                    if entry.sector.is_some() {
                        existing.sector = entry.sector;
                    }
                    if entry.industry.is_some() {
                        existing.industry = entry.industry;
                    }
                    if entry.static_description.is_some() {
                        existing.static_description = entry.static_description;
                    }
                    if entry.competitors.is_some() {
                        existing.competitors = entry.competitors;
                    }
                }
                None => {
                    let id = rows.len() as i64 + 1;
                    rows.push(Self::materialize(id, entry));
                }
            }
        }
        Ok(count)
    }
}

// =========================================================================
// MockPriceStore
// =========================================================================

#[derive(Default)]
pub(crate) struct MockPriceStore {
    rows: Mutex<HashMap<i64, PriceCacheEntry>>,
    fail: Mutex<bool>,
    attempts: AtomicUsize,
}

impl MockPriceStore {
    pub(crate) fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub(crate) fn seed(&self, ticker_id: i64, price: Option<Decimal>, at: DateTime<Utc>) {
        self.rows.lock().unwrap().insert(
            ticker_id,
            PriceCacheEntry {
                ticker_id,
                price,
                last_updated: at,
            },
        );
    }
}

#[async_trait]
impl PriceStore for MockPriceStore {
    fn get_cached_price(&self, ticker_id: i64) -> Result<Option<PriceCacheEntry>> {
        Ok(self.rows.lock().unwrap().get(&ticker_id).cloned())
    }

    async fn upsert_price(
        &self,
        ticker_id: i64,
        price: Option<Decimal>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().unwrap() {
            return Err(Error::Unexpected("Intentional save failure".into()));
        }
        self.seed(ticker_id, price, at);
        Ok(())
    }
}

/// Sink that records submissions instead of persisting them.
#[derive(Default)]
pub(crate) struct RecordingPriceSink {
    updates: Mutex<Vec<PriceUpdate>>,
}

impl RecordingPriceSink {
    pub(crate) fn updates(&self) -> Vec<PriceUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl PriceSink for RecordingPriceSink {
    fn submit(&self, update: PriceUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

// =========================================================================
// StubReasoner
// =========================================================================

pub(crate) struct StubReasoner {
    answer: std::result::Result<String, ResolveError>,
    delay: Option<Duration>,
    barrier: Option<Barrier>,
    pub(crate) calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    budgets: Mutex<Vec<u32>>,
}

impl StubReasoner {
    pub(crate) fn answering(text: &str) -> Self {
        Self::with_answer(Ok(text.to_string()))
    }

    pub(crate) fn failing(error: ResolveError) -> Self {
        Self::with_answer(Err(error))
    }

    fn with_answer(answer: std::result::Result<String, ResolveError>) -> Self {
        Self {
            answer,
            delay: None,
            barrier: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            budgets: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold every call until `n` callers are waiting, so they all answer
    /// before any of them writes.
    pub(crate) fn with_barrier(mut self, n: usize) -> Self {
        self.barrier = Some(Barrier::new(n));
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn token_budgets(&self) -> Vec<u32> {
        self.budgets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningClient for StubReasoner {
    async fn complete_json(
        &self,
        prompt: &str,
        max_output_tokens: u32,
    ) -> std::result::Result<String, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.budgets.lock().unwrap().push(max_output_tokens);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone()
    }
}

// =========================================================================
// StubProvider
// =========================================================================

/// Scripted provider response for one symbol.
#[derive(Clone)]
pub(crate) enum StubResponse {
    /// Raw Alpha Vantage body, normalized by the real adapter.
    Body(String),
    Unavailable(u16),
}

/// Provider that answers from a script and counts network calls.
pub(crate) struct StubProvider {
    adapter: AlphaVantageProvider,
    responses: Mutex<HashMap<String, StubResponse>>,
    calls: AtomicUsize,
    limit: RateLimit,
}

impl StubProvider {
    pub(crate) fn new(limit: RateLimit) -> Self {
        Self {
            adapter: AlphaVantageProvider::new("test_key".to_string()),
            responses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            limit,
        }
    }

    pub(crate) fn respond(&self, symbol: &str, response: StubResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(symbol.to_string(), response);
    }

    /// Answer `symbol` with a GLOBAL_QUOTE body at `price`.
    pub(crate) fn respond_price(&self, symbol: &str, price: &str) {
        self.respond(
            symbol,
            StubResponse::Body(format!(
                r#"{{"Global Quote": {{"01. symbol": "{}", "05. price": "{}", "06. volume": "1000", "09. change": "0.00", "10. change percent": "0.00%"}}}}"#,
                symbol, price
            )),
        );
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for StubProvider {
    fn id(&self) -> &'static str {
        "STUB"
    }

    fn rate_limit(&self) -> RateLimit {
        self.limit
    }

    async fn fetch_raw(&self, symbol: &str) -> std::result::Result<String, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.responses.lock().unwrap().get(symbol).cloned();
        match response {
            Some(StubResponse::Body(body)) => Ok(body),
            Some(StubResponse::Unavailable(status)) => Err(MarketDataError::UpstreamUnavailable {
                provider: "STUB".to_string(),
                status,
                message: "scripted failure".to_string(),
            }),
            None => Ok(r#"{"Global Quote": {}}"#.to_string()),
        }
    }

    fn normalize(
        &self,
        symbol: &str,
        raw: &str,
    ) -> std::result::Result<NormalizedQuote, MarketDataError> {
        self.adapter.normalize(symbol, raw)
    }
}
