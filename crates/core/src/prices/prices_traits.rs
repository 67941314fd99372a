use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::prices_model::{PriceCacheEntry, PriceUpdate};
use crate::errors::Result;

/// Trait defining the contract for durable price storage.
#[async_trait]
pub trait PriceStore: Send + Sync {
    fn get_cached_price(&self, ticker_id: i64) -> Result<Option<PriceCacheEntry>>;

    /// Insert or overwrite the single row for `ticker_id`.
    async fn upsert_price(
        &self,
        ticker_id: i64,
        price: Option<Decimal>,
        at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Receives durable price writes after live fetches.
///
/// # Design Rules
///
/// - `submit()` must not block and must not fail the caller
/// - Implementations queue the write and persist it in the background
pub trait PriceSink: Send + Sync {
    fn submit(&self, update: PriceUpdate);
}

/// Sink for contexts without durable storage.
#[derive(Clone, Default)]
pub struct NoOpPriceSink;

impl PriceSink for NoOpPriceSink {
    fn submit(&self, _update: PriceUpdate) {}
}
