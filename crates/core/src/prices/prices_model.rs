use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Last known price of a directory ticker, shared across processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCacheEntry {
    pub ticker_id: i64,
    /// `None` until the first successful fetch.
    pub price: Option<Decimal>,
    pub last_updated: DateTime<Utc>,
}

impl PriceCacheEntry {
    /// A usable price younger than `ttl`.
    pub fn fresh_price(&self, now: DateTime<Utc>, ttl: Duration) -> Option<Decimal> {
        let age = (now - self.last_updated).max(Duration::zero());
        self.price.filter(|_| age < ttl)
    }
}

/// A durable price write queued after a live fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: Decimal,
    pub fetched_at: DateTime<Utc>,
}
