use std::borrow::Cow;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency code. Static for every currency the suffix table knows.
pub type Currency = Cow<'static, str>;

/// Provider-independent quote shape returned by every adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedQuote {
    /// Resolved ticker the quote belongs to
    pub symbol: String,

    /// Last traded price
    pub price: Decimal,

    /// Absolute change against the previous close
    pub change: Decimal,

    /// Relative change in percent (`0.74` means 0.74 %)
    pub change_percent: Decimal,

    /// Traded volume of the current session
    pub volume: u64,

    /// Quote currency
    pub currency: Currency,
}

/// An in-memory cache entry: a quote plus the moment it was fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedQuote {
    pub data: NormalizedQuote,
    pub fetched_at: DateTime<Utc>,
}

impl CachedQuote {
    pub fn new(data: NormalizedQuote, fetched_at: DateTime<Utc>) -> Self {
        Self { data, fetched_at }
    }

    /// Age of the entry at `now`. Clamped to zero if the clock went backwards.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).max(Duration::zero())
    }

    /// An entry is fresh while its age is strictly below the TTL.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Exchange suffixes quoted in euros.
const EUR_SUFFIXES: &[&str] = &["DE", "F", "PA", "AS", "MI", "MC", "BR", "VI"];

/// Infer the quote currency from the exchange suffix of a resolved ticker.
///
/// Tickers without a recognised suffix are treated as US listings.
pub fn currency_for_symbol(symbol: &str) -> Currency {
    let suffix = match symbol.rsplit_once('.') {
        Some((_, suffix)) => suffix.to_ascii_uppercase(),
        None => return Currency::Borrowed("USD"),
    };

    match suffix.as_str() {
        s if EUR_SUFFIXES.contains(&s) => Currency::Borrowed("EUR"),
        "L" | "LON" => Currency::Borrowed("GBP"),
        "SW" => Currency::Borrowed("CHF"),
        "TO" => Currency::Borrowed("CAD"),
        _ => Currency::Borrowed("USD"),
    }
}
