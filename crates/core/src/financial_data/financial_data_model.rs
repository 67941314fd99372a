use chrono::{DateTime, Utc};
use moneta_market_data::{currency_for_symbol, Currency};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::prices::PriceCacheEntry;
use crate::quotes::QuoteLookup;
use crate::tickers::TickerEntry;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Directory metadata joined with the latest known price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialData {
    pub symbol: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub pe_ratio: Option<Decimal>,
    pub price: Decimal,
    pub currency: Currency,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: u64,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub cached_only: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub limit_reached: bool,
    pub last_updated: DateTime<Utc>,
}

impl FinancialData {
    fn with_metadata(entry: &TickerEntry, price: Decimal, last_updated: DateTime<Utc>) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            company_name: entry.company_name.clone(),
            sector: entry.sector.clone(),
            industry: entry.industry.clone(),
            description: entry.static_description.clone(),
            pe_ratio: entry.static_pe_ratio,
            price,
            currency: currency_for_symbol(&entry.symbol),
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            volume: 0,
            from_cache: true,
            cached_only: false,
            limit_reached: false,
            last_updated,
        }
    }

    /// Built from the durable price row; day change and volume are not stored.
    pub(crate) fn from_durable(entry: &TickerEntry, price: Decimal, row: &PriceCacheEntry) -> Self {
        Self::with_metadata(entry, price, row.last_updated)
    }

    pub(crate) fn from_lookup(entry: &TickerEntry, lookup: QuoteLookup) -> Self {
        let QuoteLookup {
            quote,
            from_cache,
            cached_only,
            limit_reached,
            fetched_at,
        } = lookup;
        Self {
            currency: quote.currency,
            change: quote.change,
            change_percent: quote.change_percent,
            volume: quote.volume,
            from_cache,
            cached_only,
            limit_reached,
            ..Self::with_metadata(entry, quote.price, fetched_at)
        }
    }
}
