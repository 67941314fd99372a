use chrono::{DateTime, Utc};
use moneta_market_data::NormalizedQuote;
use serde::Serialize;

fn is_false(value: &bool) -> bool {
    !*value
}

/// What a quote lookup hands back: the quote plus how it was obtained.
///
/// `cached_only` marks a degraded answer, i.e. a stale entry served because a
/// fresh one could not be fetched. `limit_reached` additionally says the
/// reason was an exhausted call budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLookup {
    #[serde(flatten)]
    pub quote: NormalizedQuote,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub cached_only: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub limit_reached: bool,
    /// When the quote was fetched from the provider.
    pub fetched_at: DateTime<Utc>,
}

impl QuoteLookup {
    pub(crate) fn live(quote: NormalizedQuote, fetched_at: DateTime<Utc>) -> Self {
        Self {
            quote,
            from_cache: false,
            cached_only: false,
            limit_reached: false,
            fetched_at,
        }
    }

    pub(crate) fn cached(quote: NormalizedQuote, fetched_at: DateTime<Utc>) -> Self {
        Self {
            from_cache: true,
            ..Self::live(quote, fetched_at)
        }
    }

    pub(crate) fn degraded(
        quote: NormalizedQuote,
        fetched_at: DateTime<Utc>,
        limit_reached: bool,
    ) -> Self {
        Self {
            from_cache: true,
            cached_only: true,
            limit_reached,
            ..Self::live(quote, fetched_at)
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.cached_only
    }
}
