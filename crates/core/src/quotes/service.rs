//! Quote cache and rate governor.
//!
//! Per lookup key the governor is in one of four states:
//!
//! | cache entry | budget    | action                                              |
//! |-------------|-----------|-----------------------------------------------------|
//! | fresh       | any       | serve from cache, no call                           |
//! | stale       | available | call; on failure serve the stale entry, degraded    |
//! | stale       | exhausted | serve the stale entry, degraded, no call            |
//! | none        | exhausted | fail with `Error::RateLimited`                      |
//!
//! A call is counted against the budget as soon as it is attempted, whether
//! or not it succeeds. Cache hits never count.

use std::sync::Arc;

use chrono::Duration;
use log::{debug, warn};
use moneta_market_data::{
    BudgetLimits, Clock, QuoteCache, QuoteProvider, RateBudget, SystemClock,
};

use super::quotes_model::QuoteLookup;
use crate::errors::{Error, MarketDataError, Result};
use crate::prices::{NoOpPriceSink, PriceSink, PriceUpdate};
use crate::tickers::{is_isin, normalize_symbol, TickerResolver};

/// Default freshness window of a quote, shared by both cache tiers.
pub const DEFAULT_QUOTE_TTL_SECS: i64 = 60 * 60;

pub struct QuoteService {
    provider: Arc<dyn QuoteProvider>,
    resolver: Arc<TickerResolver>,
    cache: Arc<QuoteCache>,
    budget: Arc<RateBudget>,
    sink: Arc<dyn PriceSink>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl QuoteService {
    /// Create a governor with the provider's own plan limits, an empty cache,
    /// the wall clock and no durable price writes.
    pub fn new(provider: Arc<dyn QuoteProvider>, resolver: Arc<TickerResolver>) -> Self {
        let budget = Arc::new(RateBudget::new(BudgetLimits::from(provider.rate_limit())));
        Self {
            provider,
            resolver,
            cache: Arc::new(QuoteCache::new()),
            budget,
            sink: Arc::new(NoOpPriceSink),
            clock: Arc::new(SystemClock),
            ttl: Duration::seconds(DEFAULT_QUOTE_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_budget(mut self, budget: Arc<RateBudget>) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_cache(mut self, cache: Arc<QuoteCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_price_sink(mut self, sink: Arc<dyn PriceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn budget(&self) -> &Arc<RateBudget> {
        &self.budget
    }

    pub fn cache(&self) -> &Arc<QuoteCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &Arc<TickerResolver> {
        &self.resolver
    }

    /// Quote for a symbol, company name or ISIN.
    ///
    /// Input whose upper-cased form already has a cache entry is taken as
    /// that ticker, so `aapl` after `AAPL` never reaches the name resolver.
    pub async fn get_quote(&self, input: &str) -> Result<QuoteLookup> {
        let key = normalize_symbol(input);
        if !key.is_empty() && !is_isin(&key) && self.cache.get(&key).is_some() {
            return self.get_quote_for_symbol(&key).await;
        }
        let symbol = self.resolver.resolve_symbol(input).await?;
        self.get_quote_for_symbol(&symbol).await
    }

    /// Quote for an already resolved ticker.
    pub async fn get_quote_for_symbol(&self, symbol: &str) -> Result<QuoteLookup> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(Error::Validation("symbol must not be empty".to_string()));
        }

        let now = self.clock.now();
        let cached = self.cache.get(&symbol);

        if let Some(entry) = &cached {
            if entry.is_fresh(now, self.ttl) {
                debug!("Quote cache hit for {}", symbol);
                return Ok(QuoteLookup::cached(entry.data.clone(), entry.fetched_at));
            }
        }

        if let Err(exhausted) = self.budget.try_acquire(now) {
            return match cached {
                Some(entry) => {
                    warn!(
                        "Quote budget exhausted ({:?} window), serving {} from {}",
                        exhausted.window, symbol, entry.fetched_at
                    );
                    Ok(QuoteLookup::degraded(entry.data, entry.fetched_at, true))
                }
                None => {
                    warn!(
                        "Quote budget exhausted ({:?} window), nothing cached for {}",
                        exhausted.window, symbol
                    );
                    Err(Error::RateLimited {
                        reset_at: exhausted.reset_at,
                    })
                }
            };
        }

        debug!("Fetching {} from {}", symbol, self.provider.id());
        match self.provider.fetch_quote(&symbol).await {
            Ok(quote) => {
                let fetched_at = self.clock.now();
                self.cache.put(&symbol, quote.clone(), fetched_at);
                self.sink.submit(PriceUpdate {
                    symbol: symbol.clone(),
                    price: quote.price,
                    fetched_at,
                });
                Ok(QuoteLookup::live(quote, fetched_at))
            }
            Err(e) => match cached {
                Some(entry) => {
                    warn!(
                        "Quote fetch for {} failed ({}), serving stale entry from {}",
                        symbol, e, entry.fetched_at
                    );
                    let throttled = matches!(e, MarketDataError::RateLimited { .. });
                    Ok(QuoteLookup::degraded(entry.data, entry.fetched_at, throttled))
                }
                None => Err(e.into()),
            },
        }
    }
}
