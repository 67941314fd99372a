use std::sync::Arc;

use log::{debug, warn};

use super::financial_data_model::FinancialData;
use crate::errors::Result;
use crate::prices::PriceStore;
use crate::quotes::QuoteService;
use crate::tickers::TickerResolver;

/// Server-side lookup: resolve the query to a directory row, then price it.
///
/// The durable price row is the cross-process freshness source. Only when it
/// is missing or older than the quote TTL does the request fall through to the
/// quote governor, which may in turn serve its own in-memory entry.
pub struct FinancialDataService {
    resolver: Arc<TickerResolver>,
    prices: Arc<dyn PriceStore>,
    quotes: Arc<QuoteService>,
}

impl FinancialDataService {
    pub fn new(
        resolver: Arc<TickerResolver>,
        prices: Arc<dyn PriceStore>,
        quotes: Arc<QuoteService>,
    ) -> Self {
        Self {
            resolver,
            prices,
            quotes,
        }
    }

    pub async fn get(&self, query: &str) -> Result<FinancialData> {
        let entry = self.resolver.resolve_entry(query).await?;
        let now = self.quotes.clock().now();

        match self.prices.get_cached_price(entry.id) {
            Ok(Some(row)) => {
                if let Some(price) = row.fresh_price(now, self.quotes.ttl()) {
                    debug!("Durable price hit for {}", entry.symbol);
                    return Ok(FinancialData::from_durable(&entry, price, &row));
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read durable price for {}: {}", entry.symbol, e),
        }

        let lookup = self.quotes.get_quote_for_symbol(&entry.symbol).await?;
        Ok(FinancialData::from_lookup(&entry, lookup))
    }
}
